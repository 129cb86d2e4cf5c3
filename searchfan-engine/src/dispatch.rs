//! Shared dispatch machinery for the execution strategies.
//!
//! Each back-end attempt runs in its own task with an explicit cancellation
//! signal threaded through, a per-call timeout, and the bounded retry loop.
//! Charging never happens here: tasks only report outcomes, and the owning
//! strategy charges in its collection loop, so a cancelled or abandoned
//! attempt can never reach the ledger.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use searchfan_core::{SearchBackend, SearchQuery, SearchResponse};

use crate::context::ExecutionOptions;
use crate::strategy::reasons;

/// Outcome of one dispatched back-end attempt (retries included).
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// The call returned a non-empty response.
    Success(SearchResponse),
    /// All attempts failed; carries the last failure reason.
    Failure(String),
    /// The attempt was cancelled before producing a result.
    Cancelled,
}

/// One back-end scheduled for dispatch: input position, id, capability.
pub(crate) type Eligible = (usize, String, Arc<dyn SearchBackend>);

/// Resolves when the cancel flag flips to true; pends forever otherwise.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without cancelling; no cancel will ever come.
            std::future::pending::<()>().await;
        }
    }
}

/// Runs the retry loop for one back-end.
///
/// An empty response counts as a failure (`no_results`) and is retried like
/// any other. Timeouts drop the in-flight call future, aborting the
/// underlying request.
pub(crate) async fn run_attempt(
    backend: Arc<dyn SearchBackend>,
    query: SearchQuery,
    options: ExecutionOptions,
    mut cancel: watch::Receiver<bool>,
) -> AttemptOutcome {
    let id = backend.id().to_string();

    for attempt in 1..=options.retry.max_attempts {
        if *cancel.borrow() {
            return AttemptOutcome::Cancelled;
        }

        debug!(backend = %id, attempt, "Calling backend");

        let call = tokio::time::timeout(options.request_timeout, backend.search(&query));
        let result = tokio::select! {
            () = cancelled(&mut cancel) => return AttemptOutcome::Cancelled,
            result = call => result,
        };

        let reason = match result {
            Ok(Ok(response)) if !response.is_empty() => {
                debug!(backend = %id, items = response.items.len(), "Backend call succeeded");
                return AttemptOutcome::Success(response);
            }
            Ok(Ok(_)) => {
                debug!(backend = %id, attempt, "Backend returned an empty result set");
                searchfan_core::SearchError::NoResults.kind().to_string()
            }
            Ok(Err(error)) => {
                warn!(backend = %id, attempt, error = %error, "Backend call failed");
                error.kind().to_string()
            }
            Err(_) => {
                warn!(backend = %id, attempt, timeout = ?options.request_timeout, "Backend call timed out");
                reasons::TIMEOUT.to_string()
            }
        };

        if !options.retry.allows_retry(attempt) {
            return AttemptOutcome::Failure(reason);
        }

        debug!(backend = %id, attempt, delay = ?options.retry.delay, "Retrying after delay");
        tokio::select! {
            () = cancelled(&mut cancel) => return AttemptOutcome::Cancelled,
            () = tokio::time::sleep(options.retry.delay) => {}
        }
    }

    AttemptOutcome::Failure(reasons::NOT_ATTEMPTED.to_string())
}

/// Spawns one attempt task without a concurrency gate.
///
/// Used by strategies that manage their own dispatch window.
pub(crate) fn spawn_one(
    set: &mut JoinSet<(usize, String, AttemptOutcome)>,
    (index, id, backend): Eligible,
    query: &SearchQuery,
    options: &ExecutionOptions,
    cancel: &watch::Sender<bool>,
) {
    let query = query.clone();
    let options = options.clone();
    let cancel_rx = cancel.subscribe();
    set.spawn(async move {
        let outcome = run_attempt(backend, query, options, cancel_rx).await;
        (index, id, outcome)
    });
}

/// Spawns all attempts behind a fair semaphore bounding concurrency.
///
/// Tasks are spawned in input order; the fair semaphore hands out slots in
/// arrival order, so dispatch follows input order even though completion
/// order does not.
pub(crate) fn spawn_bounded(
    set: &mut JoinSet<(usize, String, AttemptOutcome)>,
    eligible: Vec<Eligible>,
    query: &SearchQuery,
    options: &ExecutionOptions,
    cancel: &watch::Sender<bool>,
) {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent.max(1)));

    for (index, id, backend) in eligible {
        let semaphore = semaphore.clone();
        let query = query.clone();
        let options = options.clone();
        let mut cancel_rx = cancel.subscribe();
        set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, id, AttemptOutcome::Cancelled),
            };
            if *cancel_rx.borrow() {
                return (index, id, AttemptOutcome::Cancelled);
            }
            let outcome = run_attempt(backend, query, options, cancel_rx).await;
            (index, id, outcome)
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
