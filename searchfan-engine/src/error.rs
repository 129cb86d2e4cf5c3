//! Engine error types.

use std::time::Duration;
use thiserror::Error;

pub use searchfan_store::LedgerError;

// ============================================================================
// Engine Error
// ============================================================================

/// Structural failures surfaced by strategy execution.
///
/// Single back-end call failures are never errors at this level; they are
/// demoted to recorded attempts. These variants are the failures that mean
/// the execution itself cannot proceed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A requested back-end id has no registered implementation.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Ledger misuse or persistence failure.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A dispatched task failed to join (panicked).
    #[error("Dispatch task failed: {0}")]
    Join(String),
}

// ============================================================================
// Supervisor Error
// ============================================================================

/// Failures from the process lifecycle supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The service did not report healthy within the init timeout.
    ///
    /// Reported to the caller and not retried automatically; retry policy
    /// belongs to the caller.
    #[error("Initialization timed out after {0:?}")]
    InitializationTimeout(Duration),

    /// The start command itself failed.
    #[error("Start command failed: {0}")]
    StartFailed(String),

    /// The coalesced init attempt ended without reporting an outcome.
    #[error("Initialization attempt was interrupted")]
    InitInterrupted,
}

// ============================================================================
// Process Error
// ============================================================================

/// Error type for subprocess operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Command not found on PATH.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Command timed out.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// Non-zero exit code.
    #[error("Command exited with code {code}: {stderr}")]
    NonZeroExit {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
