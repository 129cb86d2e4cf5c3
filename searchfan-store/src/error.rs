//! Store error types.

use thiserror::Error;

/// Errors that can occur in persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the quota ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Back-end id absent from configuration. Programmer error; never retried.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// The ledger was used before `initialize()`.
    #[error("No usage record for backend {0} (ledger not initialized)")]
    NoUsageRecord(String),

    /// The persistence collaborator failed. Propagated uncaught; the ledger
    /// does not retry writes.
    #[error("Persistence error: {0}")]
    Persistence(#[from] searchfan_core::CoreError),
}
