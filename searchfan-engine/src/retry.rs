//! Retry policy for back-end calls.
//!
//! Strategies retry failed calls (timeout, error, empty result) a bounded
//! number of times with a fixed inter-attempt delay. Anything more elaborate
//! (backoff, jitter) belongs to the caller, not the engine.

use std::time::Duration;

/// Policy for retrying a failed back-end call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per back-end (1 = no retry).
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::from_millis(500),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Sets the inter-attempt delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns true if another attempt is allowed after `attempt` failures.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
