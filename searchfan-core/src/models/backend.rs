//! Back-end configuration.

use serde::{Deserialize, Serialize};

/// Static configuration for one search back-end.
///
/// Loaded once at startup and immutable afterwards. The quota ledger and
/// the execution strategies hold references to these; they never own or
/// mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Unique, stable identifier (e.g., "brave", "local-meili").
    pub id: String,

    /// Human-readable display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Monthly quota, in credits.
    pub monthly_quota: u64,

    /// Cost charged per search, in credits.
    #[serde(default = "default_cost_per_search")]
    pub cost_per_search: u64,

    /// Search endpoint URL, for HTTP-backed back-ends.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Free-form description shown in listings.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_cost_per_search() -> u64 {
    1
}

impl BackendConfig {
    /// Creates a minimal config with the given id and quota.
    pub fn new(id: impl Into<String>, monthly_quota: u64, cost_per_search: u64) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            monthly_quota,
            cost_per_search,
            endpoint: None,
            description: None,
        }
    }

    /// Returns the display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}
