//! Core error types for `searchfan`.

use thiserror::Error;

/// Core error type for `searchfan` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Back-end id is not present in the loaded configuration.
    ///
    /// This is a programmer error: the caller passed an id that was never
    /// configured. It is surfaced immediately and never retried.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// The ledger was asked to charge before `initialize()` ran.
    #[error("No usage record for backend {0} (ledger not initialized?)")]
    NoUsageRecord(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from a back-end or persisted snapshot.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error from a persistence collaborator.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error returned by a back-end search capability.
///
/// Each variant maps to one of the wire-level failure reasons recorded in
/// [`EngineAttempt`](crate::models::EngineAttempt) logs.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-level failure (connect, DNS, transport).
    #[error("Network error: {0}")]
    Network(String),

    /// The back-end API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP-level status code, if known.
        status: u16,
        /// Error message from the back-end.
        message: String,
    },

    /// The back-end returned an empty or unusable result set.
    #[error("No results")]
    NoResults,

    /// The back-end is misconfigured (bad endpoint, missing settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The back-end exists but is not currently serving requests.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl SearchError {
    /// Stable reason string recorded in attempt logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::Api { .. } => "api_error",
            Self::NoResults => "no_results",
            Self::Config(_) => "config_error",
            Self::Unavailable(_) => "provider_unavailable",
        }
    }
}
