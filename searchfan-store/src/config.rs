//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use searchfan_core::BackendConfig;

use crate::error::StoreError;
use crate::persistence;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Configured search back-ends, in preference order.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Engine defaults applied when the caller does not override them.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Supervised local service, if any.
    #[serde(default)]
    pub service: Option<ServiceSettings>,
}

/// Engine execution defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum concurrent back-end calls.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Attempts per back-end (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

/// Settings for a supervised local search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Back-end id this service backs.
    pub backend_id: String,
    /// Compose file defining the service.
    pub compose_file: PathBuf,
    /// Service name inside the compose file.
    pub service: String,
    /// Health endpoint URL.
    pub health_url: String,
    /// Ports the service is expected to expose.
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Whether `init` may issue a start command.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// Whether `shutdown` may issue a stop command.
    #[serde(default = "default_true")]
    pub auto_stop: bool,
    /// Init timeout in seconds.
    #[serde(default = "default_init_timeout")]
    pub init_timeout_secs: u64,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_init_timeout() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl AppConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        persistence::default_config_path()
    }

    /// Loads configuration from the default path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;

        info!(path = %path.display(), backends = config.backends.len(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Looks up a back-end config by id.
    pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.id == id)
    }

    /// All configured back-end ids, in configuration order.
    pub fn backend_ids(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.id.clone()).collect()
    }
}
