//! Maximum-coverage strategy: call every eligible back-end.

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use searchfan_core::{EngineAttempt, ResultItem, SearchQuery, StrategyResult};

use crate::context::{ExecutionContext, ExecutionOptions};
use crate::dispatch::{self, AttemptOutcome};
use crate::error::EngineError;
use crate::strategy::{reasons, SearchStrategy};

/// Dispatches to every back-end that passes the credit gate, waits for all
/// attempts to settle, and concatenates successful results in back-end
/// input order.
///
/// No back-end failure aborts the others; total latency is bounded by the
/// slowest surviving attempt. Items are never re-ranked across back-ends:
/// ordering is input order first, then each back-end's own result order.
pub struct AllProvidersStrategy;

#[async_trait]
impl SearchStrategy for AllProvidersStrategy {
    fn name(&self) -> &'static str {
        "all"
    }

    #[instrument(skip(self, query, options, ctx), fields(strategy = self.name(), backends = backend_ids.len()))]
    async fn execute(
        &self,
        query: &SearchQuery,
        backend_ids: &[String],
        options: &ExecutionOptions,
        ctx: &ExecutionContext,
    ) -> Result<StrategyResult, EngineError> {
        let count = backend_ids.len();
        let mut attempts: Vec<Option<EngineAttempt>> = vec![None; count];
        let mut items_by_slot: Vec<Vec<ResultItem>> = vec![Vec::new(); count];

        // Credit gate in input order; gated back-ends are never called.
        let mut eligible = Vec::new();
        for (index, id) in backend_ids.iter().enumerate() {
            let backend = ctx
                .registry
                .get(id)
                .ok_or_else(|| EngineError::UnknownBackend(id.clone()))?;

            if ctx.ledger.has_sufficient_credits(id).await? {
                eligible.push((index, id.clone(), backend));
            } else {
                debug!(backend = %id, "Skipping backend, insufficient credits");
                attempts[index] = Some(EngineAttempt::failure(id, reasons::LOW_CREDIT));
            }
        }

        info!(eligible = eligible.len(), "Dispatching to all eligible backends");

        let (cancel_tx, _cancel_rx) = watch::channel(false);
        let mut set = JoinSet::new();
        dispatch::spawn_bounded(&mut set, eligible, query, options, &cancel_tx);

        while let Some(joined) = set.join_next().await {
            let (index, id, outcome) = joined.map_err(|e| EngineError::Join(e.to_string()))?;
            match outcome {
                AttemptOutcome::Success(response) => {
                    // Charge on observed success only; a refusal here means
                    // a concurrent spend won the remaining credits.
                    if ctx.ledger.charge_and_persist(&id).await? {
                        info!(backend = %id, items = response.items.len(), "Backend succeeded");
                        attempts[index] = Some(EngineAttempt::success(&id));
                        items_by_slot[index] = response.items;
                    } else {
                        warn!(backend = %id, "Discarding result, credits spent concurrently");
                        attempts[index] = Some(EngineAttempt::failure(&id, reasons::LOW_CREDIT));
                    }
                }
                AttemptOutcome::Failure(reason) => {
                    warn!(backend = %id, reason = %reason, "Backend attempt failed");
                    attempts[index] = Some(EngineAttempt::failure(&id, reason));
                }
                AttemptOutcome::Cancelled => {
                    attempts[index] = Some(EngineAttempt::failure(&id, reasons::CANCELLED));
                }
            }
        }

        let results: Vec<ResultItem> = items_by_slot.into_iter().flatten().collect();
        let attempts = attempts
            .into_iter()
            .zip(backend_ids)
            .map(|(attempt, id)| {
                attempt.unwrap_or_else(|| EngineAttempt::failure(id, reasons::NOT_ATTEMPTED))
            })
            .collect();

        Ok(StrategyResult { results, attempts })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackendRegistry;
    use crate::retry::RetryPolicy;
    use searchfan_core::{BackendConfig, SearchBackend, SearchError, SearchResponse};
    use searchfan_store::{MemoryStateStore, QuotaLedger};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    enum Behavior {
        Succeed,
        Fail,
        SlowSucceed(Duration),
    }

    struct MockBackend {
        id: String,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockBackend {
        fn new(id: &str, behavior: Behavior) -> (Arc<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let backend = Arc::new(Self {
                id: id.to_string(),
                behavior,
                calls: calls.clone(),
            });
            (backend, calls)
        }

        fn item(&self) -> searchfan_core::ResultItem {
            searchfan_core::ResultItem {
                title: format!("{} result", self.id),
                url: format!("https://{}.example.com", self.id),
                snippet: String::new(),
                score: None,
                source_backend: self.id.clone(),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for MockBackend {
        fn id(&self) -> &str {
            &self.id
        }

        async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed => Ok(SearchResponse {
                    items: vec![self.item()],
                    took_ms: 1,
                }),
                Behavior::Fail => Err(SearchError::Network("connection refused".into())),
                Behavior::SlowSucceed(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(SearchResponse {
                        items: vec![self.item()],
                        took_ms: delay.as_millis() as u64,
                    })
                }
            }
        }
    }

    async fn context_with(
        backends: Vec<Arc<dyn SearchBackend>>,
        configs: Vec<BackendConfig>,
    ) -> ExecutionContext {
        let mut registry = BackendRegistry::new();
        for backend in backends {
            registry.register(backend);
        }
        let ledger = QuotaLedger::new(configs, Arc::new(MemoryStateStore::new()));
        ledger.initialize().await.unwrap();
        ExecutionContext::new(Arc::new(registry), Arc::new(ledger))
    }

    fn fast_options() -> ExecutionOptions {
        ExecutionOptions::default()
            .with_timeout(Duration::from_millis(500))
            .with_retry(RetryPolicy::no_retry())
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_survivors() {
        let (a, _) = MockBackend::new("alpha", Behavior::Fail);
        let (b, _) = MockBackend::new("beta", Behavior::Succeed);
        let ctx = context_with(
            vec![a as Arc<dyn SearchBackend>, b],
            vec![
                BackendConfig::new("alpha", 100, 1),
                BackendConfig::new("beta", 100, 1),
            ],
        )
        .await;

        let ids = vec!["alpha".to_string(), "beta".to_string()];
        let result = AllProvidersStrategy
            .execute(&SearchQuery::new("rust"), &ids, &fast_options(), &ctx)
            .await
            .unwrap();

        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].source_backend, "beta");

        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].backend_id, "alpha");
        assert!(!result.attempts[0].success);
        assert_eq!(result.attempts[0].reason.as_deref(), Some("network_error"));
        assert_eq!(result.attempts[1].backend_id, "beta");
        assert!(result.attempts[1].success);
    }

    #[tokio::test]
    async fn test_exhausted_backend_is_skipped_without_a_call() {
        let (a, a_calls) = MockBackend::new("alpha", Behavior::Succeed);
        let (b, _) = MockBackend::new("beta", Behavior::Succeed);
        let ctx = context_with(
            vec![a as Arc<dyn SearchBackend>, b],
            vec![
                BackendConfig::new("alpha", 0, 1),
                BackendConfig::new("beta", 100, 1),
            ],
        )
        .await;

        let ids = vec!["alpha".to_string(), "beta".to_string()];
        let result = AllProvidersStrategy
            .execute(&SearchQuery::new("rust"), &ids, &fast_options(), &ctx)
            .await
            .unwrap();

        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.attempts[0].reason.as_deref(), Some("low_credit"));
        assert!(result.attempts[1].success);
        let snapshot = ctx.ledger.snapshot("alpha").await.unwrap();
        assert_eq!(snapshot.used, 0, "gated backend must never be charged");
    }

    #[tokio::test]
    async fn test_results_preserve_input_order_not_completion_order() {
        let (slow, _) = MockBackend::new("slow", Behavior::SlowSucceed(Duration::from_millis(80)));
        let (fast, _) = MockBackend::new("fast", Behavior::Succeed);
        let ctx = context_with(
            vec![slow as Arc<dyn SearchBackend>, fast],
            vec![
                BackendConfig::new("slow", 100, 1),
                BackendConfig::new("fast", 100, 1),
            ],
        )
        .await;

        let ids = vec!["slow".to_string(), "fast".to_string()];
        let result = AllProvidersStrategy
            .execute(&SearchQuery::new("rust"), &ids, &fast_options(), &ctx)
            .await
            .unwrap();

        let sources: Vec<_> = result
            .results
            .iter()
            .map(|item| item.source_backend.as_str())
            .collect();
        assert_eq!(sources, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_unknown_backend_id_is_an_error() {
        let ctx = context_with(vec![], vec![]).await;
        let ids = vec!["nope".to_string()];
        let err = AllProvidersStrategy
            .execute(&SearchQuery::new("rust"), &ids, &fast_options(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownBackend(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_each_success_charged_once() {
        let (a, _) = MockBackend::new("alpha", Behavior::Succeed);
        let (b, _) = MockBackend::new("beta", Behavior::Fail);
        let ctx = context_with(
            vec![a as Arc<dyn SearchBackend>, b],
            vec![
                BackendConfig::new("alpha", 10, 3),
                BackendConfig::new("beta", 10, 3),
            ],
        )
        .await;

        let ids = vec!["alpha".to_string(), "beta".to_string()];
        AllProvidersStrategy
            .execute(&SearchQuery::new("rust"), &ids, &fast_options(), &ctx)
            .await
            .unwrap();

        assert_eq!(ctx.ledger.snapshot("alpha").await.unwrap().used, 3);
        assert_eq!(
            ctx.ledger.snapshot("beta").await.unwrap().used,
            0,
            "failed attempts are never charged"
        );
    }
}
