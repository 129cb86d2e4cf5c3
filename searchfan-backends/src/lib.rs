// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # SearchFan Backends
//!
//! Concrete search back-end implementations for the SearchFan federated
//! search application.
//!
//! - [`http::HttpSearchBackend`] - SearXNG-compatible HTTP JSON endpoint
//! - [`managed::ManagedBackend`] - lifecycle-gated wrapper for back-ends
//!   whose local service is driven by a supervisor
//!
//! [`build_registry`] assembles a [`BackendRegistry`] from configuration,
//! wrapping the supervised back-end (if one is configured) automatically.

pub mod http;
pub mod managed;

use std::sync::Arc;
use tracing::{debug, info};

use searchfan_core::SearchError;
use searchfan_engine::{BackendRegistry, LifecycleSupervisor};
use searchfan_store::AppConfig;

pub use http::HttpSearchBackend;
pub use managed::ManagedBackend;

/// Builds a registry with one HTTP back-end per configured entry.
///
/// Back-ends without an endpoint are rejected: configuration is the only
/// place an endpoint can come from. When `supervisor` is given, the
/// back-end matching its configured id is wrapped in a [`ManagedBackend`].
pub fn build_registry(
    config: &AppConfig,
    supervisor: Option<&Arc<LifecycleSupervisor>>,
) -> Result<BackendRegistry, SearchError> {
    let mut registry = BackendRegistry::new();

    for backend_config in &config.backends {
        let endpoint = backend_config.endpoint.as_deref().ok_or_else(|| {
            SearchError::Config(format!("backend {} has no endpoint", backend_config.id))
        })?;

        let backend: Arc<dyn searchfan_core::SearchBackend> =
            Arc::new(HttpSearchBackend::new(&backend_config.id, endpoint)?);

        let backend: Arc<dyn searchfan_core::SearchBackend> = match supervisor {
            Some(supervisor) if supervisor.config().backend_id == backend_config.id => {
                debug!(backend = %backend_config.id, "Wrapping backend with lifecycle gate");
                Arc::new(ManagedBackend::new(backend, supervisor.clone()))
            }
            _ => backend,
        };

        registry.register(backend);
    }

    info!(backends = registry.len(), "Built backend registry");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchfan_core::BackendConfig;

    fn config_with(backends: Vec<BackendConfig>) -> AppConfig {
        AppConfig {
            backends,
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_build_registry_from_config() {
        let mut a = BackendConfig::new("searx", 2000, 1);
        a.endpoint = Some("http://127.0.0.1:8888/search".to_string());
        let mut b = BackendConfig::new("meili", 1000, 1);
        b.endpoint = Some("http://127.0.0.1:7700/search".to_string());

        let registry = build_registry(&config_with(vec![a, b]), None).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("searx"));
        assert!(registry.contains("meili"));
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let config = config_with(vec![BackendConfig::new("searx", 2000, 1)]);

        let err = build_registry(&config, None).unwrap_err();
        assert_eq!(err.kind(), "config_error");
    }
}
