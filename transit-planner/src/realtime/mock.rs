//! Static live feed source for offline runs and tests.
//!
//! Serves recorded GTFS-Realtime snapshots as if they were live responses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gtfs_realtime::FeedMessage;
use prost::Message;
use tokio::sync::RwLock;
use tracing::info;

use super::convert::convert_feed;
use super::error::FeedError;
use super::feed::LiveFeedSnapshot;
use super::source::LiveFeedSource;

/// Live feed source backed by fixed snapshots.
#[derive(Clone, Default)]
pub struct StaticFeedSource {
    /// Snapshots keyed by partition name.
    feeds: Arc<RwLock<HashMap<String, Arc<LiveFeedSnapshot>>>>,
}

impl StaticFeedSource {
    /// Create a source serving one snapshot per partition.
    pub fn from_snapshots(feeds: impl IntoIterator<Item = (String, LiveFeedSnapshot)>) -> Self {
        let feeds = feeds
            .into_iter()
            .map(|(name, feed)| (name, Arc::new(feed)))
            .collect();
        Self {
            feeds: Arc::new(RwLock::new(feeds)),
        }
    }

    /// Load recorded feeds from a directory.
    ///
    /// Expects protobuf files named `{partition}.pb` (e.g. `metro.pb`).
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let feeds = load_dir(data_dir.as_ref())?;
        Ok(Self {
            feeds: Arc::new(RwLock::new(feeds)),
        })
    }

    /// Names of the partitions this source serves.
    pub async fn partitions(&self) -> Vec<String> {
        let mut names: Vec<_> = self.feeds.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Reload all feeds from a directory, replacing the current set.
    pub async fn reload(&self, data_dir: impl AsRef<Path>) -> Result<(), FeedError> {
        let feeds = load_dir(data_dir.as_ref())?;
        *self.feeds.write().await = feeds;
        Ok(())
    }
}

impl LiveFeedSource for StaticFeedSource {
    async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
        self.feeds
            .read()
            .await
            .get(partition)
            .cloned()
            .ok_or_else(|| FeedError::UnknownPartition(partition.to_string()))
    }
}

fn load_dir(data_dir: &Path) -> Result<HashMap<String, Arc<LiveFeedSnapshot>>, FeedError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| FeedError::Io { path, source }
    };

    let mut feeds = HashMap::new();
    for entry in std::fs::read_dir(data_dir).map_err(io_err(data_dir))? {
        let path = entry.map_err(io_err(data_dir))?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("pb") {
            continue;
        }
        let Some(partition) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let bytes = std::fs::read(&path).map_err(io_err(&path))?;
        let message = FeedMessage::decode(bytes.as_slice())?;
        let snapshot = convert_feed(&message);
        info!(partition, trips = snapshot.len(), "loaded recorded live feed");
        feeds.insert(partition.to_string(), Arc::new(snapshot));
    }

    if feeds.is_empty() {
        return Err(FeedError::NotConfigured(format!(
            "no .pb feed files found in {}",
            data_dir.display()
        )));
    }

    Ok(feeds)
}
