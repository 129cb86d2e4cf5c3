//! Execution context: the back-end registry and options handed to strategies.
//!
//! The registry is an explicit object constructed once at process start and
//! passed by reference; there is no global registration. New back-ends are
//! added by implementing [`SearchBackend`] and registering an instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use searchfan_core::SearchBackend;
use searchfan_store::{EngineConfig, QuotaLedger};

use crate::retry::RetryPolicy;

// ============================================================================
// Backend Registry
// ============================================================================

/// Read-only mapping from back-end id to its search capability.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn SearchBackend>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a back-end under its own id. Replaces any previous
    /// registration for the same id.
    pub fn register(&mut self, backend: Arc<dyn SearchBackend>) {
        self.backends.insert(backend.id().to_string(), backend);
    }

    /// Looks up a back-end by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn SearchBackend>> {
        self.backends.get(id).cloned()
    }

    /// Returns true if the id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.backends.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered back-ends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if no back-end is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

// ============================================================================
// Execution Options
// ============================================================================

/// Per-execution tuning for a strategy run.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum number of back-end calls in flight at once.
    pub max_concurrent: usize,
    /// Deadline for each individual back-end call attempt.
    pub request_timeout: Duration,
    /// Retry policy applied per back-end.
    pub retry: RetryPolicy,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExecutionOptions {
    /// Builds options from persisted engine config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            retry: RetryPolicy::new(config.max_attempts)
                .with_delay(Duration::from_millis(config.retry_delay_ms)),
        }
    }

    /// Sets the concurrency bound.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================================
// Execution Context
// ============================================================================

/// Read-only context handed to every strategy execution.
///
/// Bundles the back-end registry and the quota ledger. Process-managed
/// back-ends are expected to have been driven to a ready state by the
/// caller before dispatch; strategies never touch lifecycle.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Registered back-end capabilities.
    pub registry: Arc<BackendRegistry>,
    /// Credit gate consulted before every call.
    pub ledger: Arc<QuotaLedger>,
}

impl ExecutionContext {
    /// Creates a context over a registry and ledger.
    pub fn new(registry: Arc<BackendRegistry>, ledger: Arc<QuotaLedger>) -> Self {
        Self { registry, ledger }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("backends", &self.registry.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
