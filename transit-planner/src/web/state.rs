//! Application state for the web layer.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::cache::CachedFeedSource;
use crate::network::NetworkHandle;
use crate::planner::SearchConfig;
use crate::realtime::{
    FeedError, GtfsRealtimeClient, LiveFeedSnapshot, LiveFeedSource, RealtimeOverlay,
    StaticFeedSource,
};

/// The live feed backend the server was started with.
pub enum LiveFeed {
    /// Live API behind a short-lived cache
    Api(CachedFeedSource<GtfsRealtimeClient>),
    /// Recorded snapshots
    Recorded(StaticFeedSource),
}

impl LiveFeedSource for LiveFeed {
    async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
        match self {
            LiveFeed::Api(source) => source.fetch(partition).await,
            LiveFeed::Recorded(source) => source.fetch(partition).await,
        }
    }
}

impl LiveFeed {
    /// Drop cached API responses, or re-read recorded snapshots from `dir`.
    ///
    /// Returns whether anything was refreshed.
    pub async fn refresh(&self, dir: Option<&Path>) -> Result<bool, FeedError> {
        match (self, dir) {
            (LiveFeed::Api(source), _) => {
                info!(dropped = source.entry_count(), "clearing live feed cache");
                source.invalidate_all();
                Ok(true)
            }
            (LiveFeed::Recorded(source), Some(dir)) => {
                source.reload(dir).await?;
                let partitions = source.partitions().await;
                info!(partitions = ?partitions, "recorded live feeds reloaded");
                Ok(true)
            }
            (LiveFeed::Recorded(_), None) => Ok(false),
        }
    }
}

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Current compiled network
    pub network: NetworkHandle,

    /// Journey planner configuration
    pub config: Arc<SearchConfig>,

    /// Realtime overlay, if a live feed is configured
    pub realtime: Option<Arc<RealtimeOverlay<LiveFeed>>>,

    /// Partition used when a request names none
    pub default_partition: Arc<str>,

    /// GTFS directory the network is reloaded from
    pub gtfs_dir: Option<Arc<Path>>,

    /// Directory of recorded live feeds, if serving recorded data
    pub feed_dir: Option<Arc<Path>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        network: NetworkHandle,
        config: SearchConfig,
        realtime: Option<RealtimeOverlay<LiveFeed>>,
        default_partition: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            network,
            config: Arc::new(config),
            realtime: realtime.map(Arc::new),
            default_partition: default_partition.into(),
            gtfs_dir: None,
            feed_dir: None,
        }
    }

    /// Set the directories `POST /admin/reload` reads from.
    pub fn with_data_dirs(mut self, gtfs_dir: &Path, feed_dir: Option<&Path>) -> Self {
        self.gtfs_dir = Some(Arc::from(gtfs_dir));
        self.feed_dir = feed_dir.map(Arc::from);
        self
    }
}
