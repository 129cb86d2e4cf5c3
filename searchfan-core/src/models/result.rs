//! Query and result types.
//!
//! - [`SearchQuery`] - input to a back-end search
//! - [`ResultItem`] / [`SearchResponse`] - normalized back-end output
//! - [`EngineAttempt`] / [`StrategyResult`] - per-execution outcome

use serde::{Deserialize, Serialize};

// ============================================================================
// Query
// ============================================================================

/// A search query as handed to a back-end capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The query text.
    pub text: String,
    /// Maximum number of items the back-end should return.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Whether the back-end should include its raw response payload.
    #[serde(default)]
    pub include_raw: bool,
}

impl SearchQuery {
    /// Creates a query with no limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
            include_raw: false,
        }
    }

    /// Sets the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// Result Items
// ============================================================================

/// One normalized search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short text snippet.
    #[serde(default)]
    pub snippet: String,
    /// Back-end-specific relevance score, if provided.
    #[serde(default)]
    pub score: Option<f64>,
    /// Id of the back-end that produced this item.
    pub source_backend: String,
}

/// A successful response from one back-end search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Normalized result items, in the back-end's own order.
    pub items: Vec<ResultItem>,
    /// How long the back-end call took, in milliseconds.
    pub took_ms: u64,
}

impl SearchResponse {
    /// Returns true if the response carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Engine Attempt
// ============================================================================

/// Record of one back-end's outcome within a single strategy execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAttempt {
    /// The back-end that was (or would have been) called.
    pub backend_id: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Failure reason if the attempt did not succeed
    /// (e.g., `low_credit`, `timeout`, `network_error`, `cancelled`).
    #[serde(default)]
    pub reason: Option<String>,
}

impl EngineAttempt {
    /// Creates a successful attempt record.
    pub fn success(backend_id: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            success: true,
            reason: None,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(backend_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            success: false,
            reason: Some(reason.into()),
        }
    }
}

// ============================================================================
// Strategy Result
// ============================================================================

/// The aggregated outcome of one strategy execution.
///
/// `attempts` always preserves the caller's back-end input order regardless
/// of completion order. Partial success is a valid, non-error outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyResult {
    /// Merged result items.
    pub results: Vec<ResultItem>,
    /// One attempt record per requested back-end, in input order.
    pub attempts: Vec<EngineAttempt>,
}

impl StrategyResult {
    /// Returns true if no back-end produced results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Ids of back-ends whose attempt succeeded, in input order.
    pub fn successful_backends(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.backend_id.as_str())
            .collect()
    }

    /// Attempt records that failed, in input order.
    pub fn failed_attempts(&self) -> Vec<&EngineAttempt> {
        self.attempts.iter().filter(|a| !a.success).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_constructors() {
        let ok = EngineAttempt::success("brave");
        assert!(ok.success);
        assert!(ok.reason.is_none());

        let failed = EngineAttempt::failure("brave", "timeout");
        assert!(!failed.success);
        assert_eq!(failed.reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_strategy_result_accessors() {
        let result = StrategyResult {
            results: vec![],
            attempts: vec![
                EngineAttempt::failure("a", "low_credit"),
                EngineAttempt::success("b"),
            ],
        };

        assert!(result.is_empty());
        assert_eq!(result.successful_backends(), vec!["b"]);
        assert_eq!(result.failed_attempts().len(), 1);
    }

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("rust async").with_limit(5);
        assert_eq!(query.limit, Some(5));
        assert!(!query.include_raw);
    }
}
