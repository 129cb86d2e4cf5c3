//! Lifecycle-gated wrapper for process-managed back-ends.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use searchfan_core::{SearchBackend, SearchError, SearchQuery, SearchResponse};
use searchfan_engine::LifecycleSupervisor;

/// Wraps a back-end whose service is driven by a [`LifecycleSupervisor`].
///
/// Searches are refused unless the supervisor reports a ready state, so a
/// stopped or failed local service surfaces as a normal per-back-end
/// failure (`provider_unavailable`) instead of a connection error storm.
pub struct ManagedBackend {
    inner: Arc<dyn SearchBackend>,
    supervisor: Arc<LifecycleSupervisor>,
}

impl ManagedBackend {
    /// Gates `inner` behind the supervisor's lifecycle state.
    pub fn new(inner: Arc<dyn SearchBackend>, supervisor: Arc<LifecycleSupervisor>) -> Self {
        Self { inner, supervisor }
    }

    /// The supervisor driving this back-end's service.
    pub fn supervisor(&self) -> &Arc<LifecycleSupervisor> {
        &self.supervisor
    }
}

#[async_trait]
impl SearchBackend for ManagedBackend {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let state = self.supervisor.state().await;
        if !state.is_ready() {
            warn!(backend = %self.inner.id(), state = %state, "Refusing search, service not ready");
            return Err(SearchError::Unavailable(format!(
                "service is {state}, not ready for searches"
            )));
        }
        self.inner.search(query).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use searchfan_core::{ProcessStatus, ResultItem};
    use searchfan_engine::supervisor::ServiceConfig;
    use searchfan_engine::{HealthProbe, ProcessControl, ProcessError};
    use std::path::PathBuf;
    use std::time::Duration;

    struct StaticBackend;

    #[async_trait]
    impl SearchBackend for StaticBackend {
        fn id(&self) -> &str {
            "local-meili"
        }

        async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse {
                items: vec![ResultItem {
                    title: "hit".into(),
                    url: "https://example.com".into(),
                    snippet: String::new(),
                    score: None,
                    source_backend: "local-meili".into(),
                }],
                took_ms: 1,
            })
        }
    }

    struct NoopControl;

    #[async_trait]
    impl ProcessControl for NoopControl {
        async fn start(&self) -> Result<(), ProcessError> {
            Ok(())
        }
        async fn stop(&self) -> Result<(), ProcessError> {
            Ok(())
        }
        async fn status(&self) -> Result<ProcessStatus, ProcessError> {
            Ok(ProcessStatus::Running)
        }
        fn tool(&self) -> &str {
            "sh"
        }
    }

    struct AlwaysHealthy;

    #[async_trait]
    impl HealthProbe for AlwaysHealthy {
        async fn check(&self) -> bool {
            true
        }
    }

    fn supervisor() -> Arc<LifecycleSupervisor> {
        let config = ServiceConfig {
            backend_id: "local-meili".to_string(),
            compose_file: PathBuf::from("docker-compose.yml"),
            service: "meilisearch".to_string(),
            health_url: "http://127.0.0.1:7700/health".to_string(),
            ports: vec![7700],
            auto_start: true,
            auto_stop: true,
            init_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        };
        Arc::new(LifecycleSupervisor::new(
            config,
            Arc::new(NoopControl),
            Arc::new(AlwaysHealthy),
        ))
    }

    #[tokio::test]
    async fn test_refuses_search_before_init() {
        let backend = ManagedBackend::new(Arc::new(StaticBackend), supervisor());

        let err = backend.search(&SearchQuery::new("rust")).await.unwrap_err();

        assert_eq!(err.kind(), "provider_unavailable");
    }

    #[tokio::test]
    async fn test_delegates_once_ready() {
        let supervisor = supervisor();
        let backend = ManagedBackend::new(Arc::new(StaticBackend), supervisor.clone());

        supervisor.init().await.unwrap();
        let response = backend.search(&SearchQuery::new("rust")).await.unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(backend.id(), "local-meili");
    }

    #[tokio::test]
    async fn test_refuses_after_shutdown() {
        let supervisor = supervisor();
        let backend = ManagedBackend::new(Arc::new(StaticBackend), supervisor.clone());

        supervisor.init().await.unwrap();
        supervisor.shutdown().await;

        let err = backend.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert_eq!(err.kind(), "provider_unavailable");
    }
}
