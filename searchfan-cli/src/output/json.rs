//! JSON output formatting.

use anyhow::Result;
use searchfan_core::{BackendConfig, CreditSnapshot, EngineAttempt, ResultItem, StrategyResult};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one search run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput<'a> {
    pub query: &'a str,
    pub strategy: &'a str,
    pub results: &'a [ResultItem],
    pub attempts: &'a [EngineAttempt],
}

/// JSON output for one configured back-end.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfoOutput {
    pub id: String,
    pub display_name: String,
    pub monthly_quota: u64,
    pub cost_per_search: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// JSON output for the service status command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusOutput {
    pub backend_id: String,
    pub state: String,
    pub process_running: bool,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a search run.
    pub fn format_results(
        &self,
        query: &str,
        strategy: &str,
        result: &StrategyResult,
    ) -> Result<String> {
        self.format(&SearchOutput {
            query,
            strategy,
            results: &result.results,
            attempts: &result.attempts,
        })
    }

    /// Formats credit snapshots.
    pub fn format_snapshots(&self, snapshots: &[CreditSnapshot]) -> Result<String> {
        self.format(&snapshots)
    }

    /// Formats the configured back-end listing.
    pub fn format_backends(&self, backends: &[BackendConfig]) -> Result<String> {
        let outputs: Vec<BackendInfoOutput> = backends
            .iter()
            .map(|backend| BackendInfoOutput {
                id: backend.id.clone(),
                display_name: backend.display_name().to_string(),
                monthly_quota: backend.monthly_quota,
                cost_per_search: backend.cost_per_search,
                endpoint: backend.endpoint.clone(),
            })
            .collect();
        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================
