//! Configuration file support for vrfleakd
//!
//! Loads and validates vrfleakd configuration from TOML files.
//! Default location: /etc/sonic/vrfleakd.conf

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonic_vrfleak_common::{LeakError, LeakResult};
use tracing::warn;

use crate::matrix::MissingCellPolicy;
use crate::types::{DEFAULT_CONFIG_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORE_URL};

/// VRF store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the VRF store REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Restrict snapshots to one namespace
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Reconciliation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Maximum concurrent store calls per pass (0 = unbounded)
    #[serde(default)]
    pub max_in_flight: usize,

    /// Treatment of desired cells the caller did not supply
    #[serde(default)]
    pub missing_cells: MissingCellPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete vrfleakd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeakConfig {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Reconciliation configuration
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_base_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            namespace: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LeakConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> LeakResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                LeakError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(LeakError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> LeakResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> LeakResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LeakError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> LeakResult<()> {
        let url = self.store.base_url.trim();
        if url.is_empty() {
            return Err(LeakError::config("store.base_url must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LeakError::config(format!(
                "store.base_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.store.request_timeout_secs == 0 {
            return Err(LeakError::config("store.request_timeout_secs must be > 0"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(LeakError::config("logging.level must not be empty"));
        }
        Ok(())
    }
}
