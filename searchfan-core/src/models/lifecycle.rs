//! Lifecycle state for supervised processes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one supervised external service.
///
/// Exactly one instance exists per process-managed back-end, owned
/// exclusively by its supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No lifecycle operation has run yet.
    Uninitialized,
    /// A start command was issued; waiting for the service to report healthy.
    Starting,
    /// The service answered its last health probe.
    Healthy,
    /// The service is up but failed its last health probe. Recoverable.
    Unhealthy,
    /// A stop is in progress.
    ShuttingDown,
    /// The service is stopped (or was never started and shutdown was called).
    Stopped,
    /// Initialization failed (start error or health timeout).
    Failed,
}

impl LifecycleState {
    /// True if the service has completed init and can take traffic checks.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Healthy | Self::Unhealthy)
    }

    /// True if the state is terminal for this supervisor instance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Process-level existence, as reported by the process control collaborator.
///
/// Distinct from the health probe: a container can be `Running` while the
/// service inside is not yet accepting traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The underlying process/container exists and is running.
    Running,
    /// No running process/container.
    Stopped,
}
