//! Caching layer for live feed snapshots.
//!
//! Trip-update feeds are regenerated every few tens of seconds and are
//! several megabytes each, so concurrent plan requests share one decoded
//! snapshot per partition until it expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::realtime::{FeedError, LiveFeedSnapshot, LiveFeedSource};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached snapshots.
    pub ttl: Duration,

    /// Maximum number of cached partitions.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 16,
        }
    }
}

/// Live feed source with caching.
///
/// Wraps another source and caches its snapshots by partition name.
/// Failed fetches are not cached.
pub struct CachedFeedSource<S> {
    inner: S,
    snapshots: MokaCache<String, Arc<LiveFeedSnapshot>>,
}

impl<S> CachedFeedSource<S> {
    /// Create a new cached source.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let snapshots = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, snapshots }
    }

    /// Access the underlying source for fetches that bypass the cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.snapshots.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.snapshots.invalidate_all();
    }
}

impl<S: LiveFeedSource> LiveFeedSource for CachedFeedSource<S> {
    async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
        if let Some(cached) = self.snapshots.get(partition).await {
            debug!(partition, "live feed cache hit");
            return Ok(cached);
        }

        let snapshot = self.inner.fetch(partition).await?;
        self.snapshots
            .insert(partition.to_string(), snapshot.clone())
            .await;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts fetches and fails for any partition except `metro`.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl LiveFeedSource for CountingSource {
        async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if partition == "metro" {
                Ok(Arc::new(LiveFeedSnapshot::default()))
            } else {
                Err(FeedError::UnknownPartition(partition.to_string()))
            }
        }
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.max_capacity, 16);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cached = CachedFeedSource::new(CountingSource::default(), &CacheConfig::default());

        let first = cached.fetch("metro").await.unwrap();
        let second = cached.fetch("metro").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedFeedSource::new(CountingSource::default(), &CacheConfig::default());

        assert!(cached.fetch("vline").await.is_err());
        assert!(cached.fetch("vline").await.is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cached = CachedFeedSource::new(CountingSource::default(), &CacheConfig::default());

        cached.fetch("metro").await.unwrap();
        cached.invalidate_all();
        cached.fetch("metro").await.unwrap();

        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
