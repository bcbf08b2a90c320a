//! Live feed error types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Errors from fetching or decoding a GTFS-Realtime feed.
#[derive(Debug)]
pub enum FeedError {
    /// HTTP request failed (network error, connect timeout, etc.)
    Http(reqwest::Error),

    /// Feed body was not a valid protobuf `FeedMessage`
    Decode(prost::DecodeError),

    /// API returned an error status code
    ApiError { status: u16, message: String },

    /// Feed body exceeded the size limit
    TooLarge { bytes: usize, limit: usize },

    /// Rate limited by the API
    RateLimited,

    /// Invalid API key or unauthorized
    Unauthorized,

    /// No feed is configured for the requested partition
    UnknownPartition(String),

    /// The fetch didn't finish within the allowed time
    Timeout(Duration),

    /// Reading a recorded feed from disk failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Feature not configured or not available
    NotConfigured(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Http(e) => write!(f, "HTTP error: {e}"),
            FeedError::Decode(e) => write!(f, "feed decode error: {e}"),
            FeedError::ApiError { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            FeedError::TooLarge { bytes, limit } => {
                write!(f, "feed too large: {bytes} bytes (limit {limit})")
            }
            FeedError::RateLimited => write!(f, "rate limited by live feed API"),
            FeedError::Unauthorized => write!(f, "unauthorized (invalid API key)"),
            FeedError::UnknownPartition(name) => write!(f, "unknown feed partition: {name}"),
            FeedError::Timeout(after) => {
                write!(f, "feed fetch timed out after {}ms", after.as_millis())
            }
            FeedError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            FeedError::NotConfigured(msg) => write!(f, "not configured: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Http(e) => Some(e),
            FeedError::Decode(e) => Some(e),
            FeedError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err)
    }
}

impl From<prost::DecodeError> for FeedError {
    fn from(err: prost::DecodeError) -> Self {
        FeedError::Decode(err)
    }
}
