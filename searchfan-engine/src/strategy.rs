//! Search strategy trait and shared types.
//!
//! A strategy is one fan-out policy: which back-ends get called, under what
//! concurrency, and how their results are combined. Strategies consult the
//! quota ledger before every call and fold per-back-end outcomes into one
//! [`StrategyResult`].

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use searchfan_core::{SearchQuery, StrategyResult};

use crate::context::{ExecutionContext, ExecutionOptions};
use crate::error::EngineError;

/// Attempt failure reasons recorded by strategies, beyond the back-end
/// error kinds.
pub mod reasons {
    /// The credit pre-check failed; no call was made and nothing charged.
    pub const LOW_CREDIT: &str = "low_credit";
    /// The per-request timeout elapsed.
    pub const TIMEOUT: &str = "timeout";
    /// The attempt was cancelled after a sibling won.
    pub const CANCELLED: &str = "cancelled";
    /// The attempt never produced an outcome (internal bookkeeping gap).
    pub const NOT_ATTEMPTED: &str = "not_attempted";
}

// ============================================================================
// Strategy Trait
// ============================================================================

/// A fan-out policy over a set of back-ends.
///
/// Contract, shared by all implementations:
/// - the ledger is consulted for every back-end; a failed pre-check is
///   recorded as a `low_credit` attempt with no network call and no charge;
/// - each call runs under the per-request timeout with bounded retry;
/// - at most `max_concurrent` calls are in flight at once, dispatched in
///   input order (completion order is not guaranteed);
/// - the returned `attempts` list preserves input order;
/// - a single back-end's failure never fails `execute`; only structural
///   problems (unknown id, ledger misuse, persistence failure) do.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Short name of this strategy (e.g., "all", "first-success").
    fn name(&self) -> &'static str;

    /// Executes the query against the given back-ends.
    async fn execute(
        &self,
        query: &SearchQuery,
        backend_ids: &[String],
        options: &ExecutionOptions,
        ctx: &ExecutionContext,
    ) -> Result<StrategyResult, EngineError>;
}

// ============================================================================
// Strategy Kind
// ============================================================================

/// Selector for the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Call every eligible back-end and merge all results.
    #[default]
    All,
    /// Stop at the first back-end that returns a non-empty result.
    FirstSuccess,
}

impl StrategyKind {
    /// Builds the strategy implementation for this kind.
    pub fn build(self) -> Box<dyn SearchStrategy> {
        match self {
            Self::All => Box::new(crate::all_providers::AllProvidersStrategy),
            Self::FirstSuccess => Box::new(crate::first_success::FirstSuccessStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::FirstSuccess => write!(f, "first-success"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "first-success" | "first" => Ok(Self::FirstSuccess),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("all".parse::<StrategyKind>().unwrap(), StrategyKind::All);
        assert_eq!(
            "first-success".parse::<StrategyKind>().unwrap(),
            StrategyKind::FirstSuccess
        );
        assert_eq!(
            "first".parse::<StrategyKind>().unwrap(),
            StrategyKind::FirstSuccess
        );
        assert!("fastest".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_kind_build_names() {
        assert_eq!(StrategyKind::All.build().name(), "all");
        assert_eq!(StrategyKind::FirstSuccess.build().name(), "first-success");
    }
}
