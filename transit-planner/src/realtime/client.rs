//! GTFS-Realtime HTTP client.
//!
//! Fetches protobuf trip-update feeds for named partitions of the network
//! (each partition is one URL), decodes them and indexes them by trip.
//! No retries: a failed fetch is reported straight back to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use gtfs_realtime::FeedMessage;
use prost::Message;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use super::convert::convert_feed;
use super::error::FeedError;
use super::feed::LiveFeedSnapshot;
use super::source::LiveFeedSource;

/// Base URL for the Victorian open data GTFS-Realtime feeds.
const DEFAULT_BASE_URL: &str =
    "https://api.opendata.transport.vic.gov.au/opendata/public-transport/gtfs/realtime/v1";

/// Header carrying the subscription key.
const DEFAULT_API_KEY_HEADER: &str = "KeyID";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Feeds larger than this are rejected before decoding.
const MAX_FEED_BYTES: usize = 50 * 1024 * 1024;

/// Configuration for the live feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// API key for authentication
    pub api_key: String,
    /// Name of the header the key is sent in
    pub api_key_header: String,
    /// Partition name to trip-updates URL
    pub partitions: BTreeMap<String, String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    /// Create a new config with the given API key and the default
    /// `metro` and `vline` partitions.
    pub fn new(api_key: impl Into<String>) -> Self {
        let partitions = ["metro", "vline"]
            .into_iter()
            .map(|name| (name.to_string(), format!("{DEFAULT_BASE_URL}/{name}/trip-updates")))
            .collect();

        Self {
            api_key: api_key.into(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            partitions,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Add or replace a partition's feed URL.
    pub fn with_partition(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.partitions.insert(name.into(), url.into());
        self
    }

    /// Set the header the API key is sent in.
    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// GTFS-Realtime feed client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct GtfsRealtimeClient {
    http: reqwest::Client,
    partitions: Arc<BTreeMap<String, String>>,
    semaphore: Arc<Semaphore>,
}

impl GtfsRealtimeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        let name = HeaderName::from_bytes(config.api_key_header.as_bytes()).map_err(|_| {
            FeedError::NotConfigured(format!("invalid header name {:?}", config.api_key_header))
        })?;
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| FeedError::NotConfigured("invalid API key format".to_string()))?;
        headers.insert(name, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            partitions: Arc::new(config.partitions),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Names of the configured partitions.
    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    /// Fetch and decode the raw feed message for a partition.
    pub async fn fetch_message(&self, partition: &str) -> Result<FeedMessage, FeedError> {
        let url = self
            .partitions
            .get(partition)
            .ok_or_else(|| FeedError::UnknownPartition(partition.to_string()))?;

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FeedError::NotConfigured("client is shutting down".to_string()))?;

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FeedError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        if let Some(declared) = response.content_length() {
            check_feed_size(usize::try_from(declared).unwrap_or(usize::MAX))?;
        }
        let bytes = response.bytes().await?;
        check_feed_size(bytes.len())?;

        debug!(partition, bytes = bytes.len(), "fetched live feed");
        Ok(FeedMessage::decode(bytes.as_ref())?)
    }
}

fn check_feed_size(bytes: usize) -> Result<(), FeedError> {
    if bytes > MAX_FEED_BYTES {
        return Err(FeedError::TooLarge {
            bytes,
            limit: MAX_FEED_BYTES,
        });
    }
    Ok(())
}

impl LiveFeedSource for GtfsRealtimeClient {
    async fn fetch(&self, partition: &str) -> Result<Arc<LiveFeedSnapshot>, FeedError> {
        let message = self.fetch_message(partition).await?;
        Ok(Arc::new(convert_feed(&message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partitions() {
        let config = FeedClientConfig::new("secret");
        assert_eq!(config.api_key_header, "KeyID");
        assert_eq!(
            config.partitions.get("metro").map(String::as_str),
            Some(
                "https://api.opendata.transport.vic.gov.au/opendata/public-transport/gtfs/realtime/v1/metro/trip-updates"
            )
        );
        assert!(config.partitions.contains_key("vline"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn builder_overrides() {
        let config = FeedClientConfig::new("secret")
            .with_partition("tram", "http://localhost:9000/tram")
            .with_api_key_header("x-api-key")
            .with_max_concurrent(2)
            .with_timeout(5);
        assert_eq!(config.partitions.len(), 3);
        assert_eq!(config.api_key_header, "x-api-key");
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout_secs, 5);

        let client = GtfsRealtimeClient::new(config).unwrap();
        let names: Vec<_> = client.partitions().collect();
        assert_eq!(names, vec!["metro", "tram", "vline"]);
    }

    #[test]
    fn rejects_invalid_api_key() {
        let result = GtfsRealtimeClient::new(FeedClientConfig::new("bad\nkey"));
        assert!(matches!(result, Err(FeedError::NotConfigured(_))));
    }

    #[test]
    fn feed_size_limit() {
        assert!(check_feed_size(0).is_ok());
        assert!(check_feed_size(MAX_FEED_BYTES).is_ok());
        let err = check_feed_size(MAX_FEED_BYTES + 1).unwrap_err();
        assert!(matches!(
            err,
            FeedError::TooLarge { bytes, limit } if bytes == MAX_FEED_BYTES + 1 && limit == MAX_FEED_BYTES
        ));
    }

    #[tokio::test]
    async fn unknown_partition() {
        let client = GtfsRealtimeClient::new(FeedClientConfig::new("secret")).unwrap();
        let err = client.fetch("ferry").await.unwrap_err();
        assert!(matches!(err, FeedError::UnknownPartition(name) if name == "ferry"));
    }
}
