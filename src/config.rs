//! Configuration types for xkcd-mirror

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use url::Url;

/// Remote source settings (where documents are fetched from)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the series (default: "https://xkcd.com")
    ///
    /// The latest document lives at `{base_url}/info.0.json` and document `n`
    /// at `{base_url}/n/info.0.json`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Synchronization behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of fetches in flight at once (default: 20)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Capacity of the hand-off channel between fetch tasks and the collection
    /// writer (default: 100)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Interval between progress reports (default: 500 ms)
    #[serde(default = "default_progress_interval", with = "millis_serde")]
    pub progress_interval: Duration,

    /// Download the image referenced by each document (default: true)
    #[serde(default = "default_true")]
    pub fetch_payloads: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            channel_capacity: default_channel_capacity(),
            progress_interval: default_progress_interval(),
            fetch_payloads: true,
        }
    }
}

/// Local storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the index and logs (default: "~/.xkcd")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Index file name inside `data_dir` (default: "index.db")
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            index_file: default_index_file(),
        }
    }
}

impl PersistenceConfig {
    /// Full path of the index database
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_file)
    }

    /// Directory for log files
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Read-only API server settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the API server to (default: 127.0.0.1:4000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
        }
    }
}

/// Main configuration for the mirror
///
/// Every field has a default, so an empty TOML file (or no file at all) is a
/// valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote source
    #[serde(default)]
    pub source: SourceConfig,

    /// Synchronization behaviour
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API server
    #[serde(default)]
    pub server: ApiConfig,
}

impl Config {
    /// Read a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            message: format!("invalid configuration: {}", e),
            key: None,
        })
    }

    /// Check values that serde cannot validate on its own
    pub fn validate(&self) -> Result<()> {
        if self.sync.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("sync.concurrency".to_string()),
            });
        }
        if self.sync.channel_capacity == 0 {
            return Err(Error::Config {
                message: "channel capacity must be at least 1".to_string(),
                key: Some("sync.channel_capacity".to_string()),
            });
        }
        if self.sync.progress_interval.is_zero() {
            return Err(Error::Config {
                message: "progress interval must be positive".to_string(),
                key: Some("sync.progress_interval".to_string()),
            });
        }
        self.base_url()?;
        Ok(())
    }

    /// Parsed base URL, normalized to end with a slash so relative joins keep
    /// any path prefix
    pub fn base_url(&self) -> Result<Url> {
        crate::fetcher::parse_base_url(&self.source.base_url)
    }
}

fn default_base_url() -> String {
    "https://xkcd.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("xkcd-mirror/{}", env!("CARGO_PKG_VERSION"))
}

fn default_concurrency() -> usize {
    20
}

fn default_channel_capacity() -> usize {
    100
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_data_dir() -> PathBuf {
    dirs_next::home_dir()
        .map(|home| home.join(".xkcd"))
        .unwrap_or_else(|| PathBuf::from(".xkcd"))
}

fn default_index_file() -> String {
    "index.db".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
