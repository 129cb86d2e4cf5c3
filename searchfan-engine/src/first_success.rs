//! Minimum-latency strategy: stop at the first non-empty success.

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use searchfan_core::{EngineAttempt, ResultItem, SearchQuery, StrategyResult};

use crate::context::{ExecutionContext, ExecutionOptions};
use crate::dispatch::{self, AttemptOutcome, Eligible};
use crate::error::EngineError;
use crate::strategy::{reasons, SearchStrategy};

/// Dispatches back-ends in input order until one attempt succeeds with a
/// non-empty result, then cancels the in-flight siblings and stops.
///
/// Only the winner is charged; cancelled or late-finishing siblings are
/// discarded without charging. If every back-end fails, the result carries
/// zero items and a complete attempts log; that is a data outcome, not an
/// error.
///
/// The dispatch window is managed directly (not via a shared semaphore) so
/// that once a winner is known, no further back-end is ever dispatched.
pub struct FirstSuccessStrategy;

#[async_trait]
impl SearchStrategy for FirstSuccessStrategy {
    fn name(&self) -> &'static str {
        "first-success"
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

        let mut eligible: Vec<Eligible> = Vec::new();
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

        let (cancel_tx, _cancel_rx) = watch::channel(false);
        let mut set = JoinSet::new();
        let mut pending = eligible.into_iter();

        // Fill the initial dispatch window; replenish only while no winner.
        for _ in 0..options.max_concurrent.max(1) {
            match pending.next() {
                Some(entry) => dispatch::spawn_one(&mut set, entry, query, options, &cancel_tx),
                None => break,
            }
        }

        let mut winner_items: Vec<ResultItem> = Vec::new();

        while let Some(joined) = set.join_next().await {
            let (index, id, outcome) = joined.map_err(|e| EngineError::Join(e.to_string()))?;
            match outcome {
                AttemptOutcome::Success(response) => {
                    if ctx.ledger.charge_and_persist(&id).await? {
                        info!(backend = %id, items = response.items.len(), "First success, cancelling siblings");
                        attempts[index] = Some(EngineAttempt::success(&id));
                        winner_items = response.items;

                        let _ = cancel_tx.send(true);

                        // Drain in-flight siblings; their completions are
                        // discarded and never charged.
                        while let Some(joined) = set.join_next().await {
                            let (index, id, _outcome) =
                                joined.map_err(|e| EngineError::Join(e.to_string()))?;
                            attempts[index] =
                                Some(EngineAttempt::failure(&id, reasons::CANCELLED));
                        }
                        break;
                    }

                    // Lost the remaining credits to a concurrent spend;
                    // treat like a gated back-end and keep going.
                    warn!(backend = %id, "Discarding result, credits spent concurrently");
                    attempts[index] = Some(EngineAttempt::failure(&id, reasons::LOW_CREDIT));
                    if let Some(entry) = pending.next() {
                        dispatch::spawn_one(&mut set, entry, query, options, &cancel_tx);
                    }
                }
                AttemptOutcome::Failure(reason) => {
                    warn!(backend = %id, reason = %reason, "Backend attempt failed");
                    attempts[index] = Some(EngineAttempt::failure(&id, reason));
                    if let Some(entry) = pending.next() {
                        dispatch::spawn_one(&mut set, entry, query, options, &cancel_tx);
                    }
                }
                AttemptOutcome::Cancelled => {
                    attempts[index] = Some(EngineAttempt::failure(&id, reasons::CANCELLED));
                }
            }
        }

        if winner_items.is_empty() {
            info!("No backend produced results");
        }

        // Back-ends never dispatched because a winner appeared first.
        let attempts = attempts
            .into_iter()
            .zip(backend_ids)
            .map(|(attempt, id)| {
                attempt.unwrap_or_else(|| EngineAttempt::failure(id, reasons::CANCELLED))
            })
            .collect();

        Ok(StrategyResult {
            results: winner_items,
            attempts,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
