//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default live feed partition for realtime requests.
const DEFAULT_PARTITION: &str = "metro";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where live feed data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveFeedSetting {
    /// Realtime is unavailable.
    Disabled,
    /// Fetch from the live API with this key.
    Api { api_key: String },
    /// Serve recorded `<partition>.pb` files from a directory.
    Recorded { dir: PathBuf },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the GTFS static text files.
    pub gtfs_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub live_feed: LiveFeedSetting,
    /// Partition used when a request doesn't name one.
    pub default_partition: String,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `GTFS_DIR` | GTFS directory (required) |
    /// | `BIND_ADDR` | listen address, default `127.0.0.1:3000` |
    /// | `LIVE_FEED_API_KEY` | live feed API key |
    /// | `LIVE_FEED_MOCK_DIR` | recorded feeds, used when no API key is set |
    /// | `DEFAULT_PARTITION` | default feed partition, default `metro` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let gtfs_dir = get("GTFS_DIR")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("GTFS_DIR"))?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let live_feed = match (get("LIVE_FEED_API_KEY"), get("LIVE_FEED_MOCK_DIR")) {
            (Some(api_key), _) => LiveFeedSetting::Api { api_key },
            (None, Some(dir)) => LiveFeedSetting::Recorded {
                dir: PathBuf::from(dir),
            },
            (None, None) => LiveFeedSetting::Disabled,
        };

        let default_partition =
            get("DEFAULT_PARTITION").unwrap_or_else(|| DEFAULT_PARTITION.to_string());

        Ok(Self {
            gtfs_dir,
            bind_addr,
            live_feed,
            default_partition,
        })
    }
}
