//! CLI command implementations.

pub mod backends;
pub mod credits;
pub mod search;
pub mod service;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use searchfan_engine::LifecycleSupervisor;
use searchfan_store::{persistence, AppConfig, JsonStateStore, QuotaLedger};

use crate::Cli;

/// Everything a command needs: config, the initialized ledger, and the
/// service supervisor when one is configured.
pub struct AppContext {
    pub config: AppConfig,
    pub ledger: Arc<QuotaLedger>,
    pub supervisor: Option<Arc<LifecycleSupervisor>>,
}

impl AppContext {
    /// Loads configuration and initializes the quota ledger.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(AppConfig::default_path);
        let config = AppConfig::load_from(&config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?;

        let state_path = cli
            .state
            .clone()
            .unwrap_or_else(persistence::default_usage_state_path);
        debug!(state = %state_path.display(), "Opening usage state store");

        let store = Arc::new(JsonStateStore::new(state_path));
        let ledger = Arc::new(QuotaLedger::new(config.backends.clone(), store));
        ledger.initialize().await.context("initializing quota ledger")?;

        let supervisor = config
            .service
            .as_ref()
            .map(|settings| Arc::new(LifecycleSupervisor::from_settings(settings)));

        Ok(Self {
            config,
            ledger,
            supervisor,
        })
    }
}

/// Resolves a comma-separated back-end selection against the configuration.
///
/// `None` means all configured back-ends, in configuration order.
pub fn resolve_backend_ids(config: &AppConfig, selection: Option<&str>) -> Result<Vec<String>> {
    match selection {
        None => {
            let ids = config.backend_ids();
            anyhow::ensure!(!ids.is_empty(), "no backends configured");
            Ok(ids)
        }
        Some(list) => {
            let mut ids = Vec::new();
            for id in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                anyhow::ensure!(config.backend(id).is_some(), "unknown backend: {id}");
                ids.push(id.to_string());
            }
            anyhow::ensure!(!ids.is_empty(), "empty backend selection");
            Ok(ids)
        }
    }
}

/// Default config file location, for help text.
pub fn default_config_display() -> PathBuf {
    AppConfig::default_path()
}
