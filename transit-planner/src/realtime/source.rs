//! Live feed source abstraction.

use std::future::Future;
use std::sync::Arc;

use super::error::FeedError;
use super::feed::LiveFeedSnapshot;

/// Something that can produce the current live snapshot for a feed
/// partition (for example `"metro"` or `"vline"`).
///
/// Implemented by the HTTP client, the in-memory source used for tests and
/// offline runs, and the caching wrapper.
pub trait LiveFeedSource: Send + Sync {
    /// Fetch the latest snapshot for `partition`.
    fn fetch(
        &self,
        partition: &str,
    ) -> impl Future<Output = Result<Arc<LiveFeedSnapshot>, FeedError>> + Send;
}
