//! Configuration management for Eddy.
//!
//! Configuration is read from `~/.config/eddy/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

mod interval;

pub use interval::{format_interval, parse_interval};

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub analytics: AnalyticsConfig,
}

/// Content service connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the content API; channel routes are resolved against it
    pub base_url: String,
    /// Upper bound for every request in seconds (default: 10)
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_secs: 10,
            user_agent: concat!("eddy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between background checks for new posts (default: 30)
    pub poll_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// View reporting. Nothing leaves the process unless `enabled` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Delivery endpoint, relative to `api.base_url` or absolute
    pub endpoint: String,
    /// Continuous visibility required before a post counts as seen
    pub dwell_ms: u64,
    pub flush_interval_secs: u64,
    /// Delay before retrying a failed delivery
    pub retry_backoff_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "views".to_string(),
            dwell_ms: 3000,
            flush_interval_secs: 10,
            retry_backoff_secs: 3,
        }
    }
}

impl AnalyticsConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs.max(1))
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(config_path)
    }

    pub fn load_from(config_path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/eddy/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("eddy").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Eddy Configuration

[api]
# Root of the content service
base_url = "http://localhost:8080/api/"

# Request timeout in seconds
timeout_secs = 10

[sync]
# Seconds between background checks for new posts
poll_interval_secs = 30

[analytics]
# Report viewed posts. Leave disabled outside production.
enabled = false

# Delivery endpoint, relative to api.base_url
endpoint = "views"

# A post counts as seen after this much continuous visibility
dwell_ms = 3000

# Seconds between batch deliveries
flush_interval_secs = 10

# Seconds to wait before retrying a failed delivery
retry_backoff_secs = 3
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
