//! Usage accounting types.
//!
//! - [`UsageRecord`] - persisted per-back-end usage state
//! - [`CreditSnapshot`] - derived, read-only credit view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;

/// Format string for the calendar-month key.
const MONTH_KEY_FORMAT: &str = "%Y-%m";

/// Returns the current calendar-month key (`YYYY-MM`, UTC).
///
/// Monthly resets are keyed off this string, not an elapsed-time window:
/// a record resets on the first observation after a month boundary.
pub fn current_month_key() -> String {
    Utc::now().format(MONTH_KEY_FORMAT).to_string()
}

// ============================================================================
// Usage Record
// ============================================================================

/// Mutable per-back-end usage state, persisted as part of the full snapshot.
///
/// `last_reset` is kept as an RFC 3339 string rather than a typed timestamp
/// so one corrupted value degrades to a forced reset for that record instead
/// of failing deserialization of the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Credits used in the current month.
    pub used: u64,
    /// When this record was last reset (RFC 3339).
    pub last_reset: String,
}

impl UsageRecord {
    /// Creates a fresh zero-usage record reset now.
    pub fn fresh() -> Self {
        Self {
            used: 0,
            last_reset: Utc::now().to_rfc3339(),
        }
    }

    /// Returns the `YYYY-MM` month key of `last_reset`, or `None` if the
    /// stored timestamp does not parse. Malformed timestamps are treated as
    /// "different month" by callers, forcing a reset.
    pub fn reset_month(&self) -> Option<String> {
        DateTime::parse_from_rfc3339(&self.last_reset)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).format(MONTH_KEY_FORMAT).to_string())
    }

    /// Returns true if this record belongs to a month other than `month`.
    pub fn needs_reset(&self, month: &str) -> bool {
        match self.reset_month() {
            Some(m) => m != month,
            None => true,
        }
    }

    /// Resets usage to zero, stamping `last_reset` with the current time.
    pub fn reset(&mut self) {
        self.used = 0;
        self.last_reset = Utc::now().to_rfc3339();
    }
}

impl Default for UsageRecord {
    fn default() -> Self {
        Self::fresh()
    }
}

// ============================================================================
// Credit Snapshot
// ============================================================================

/// Derived, read-only view of one back-end's credit position.
///
/// Computed on demand from a [`BackendConfig`] and a [`UsageRecord`];
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSnapshot {
    /// Back-end identifier.
    pub backend_id: String,
    /// Monthly quota, in credits.
    pub quota: u64,
    /// Credits used this month.
    pub used: u64,
    /// Credits remaining (`max(0, quota - used)`).
    pub remaining: u64,
    /// True if the remaining credits cannot cover one more search.
    pub is_exhausted: bool,
}

impl CreditSnapshot {
    /// Computes the snapshot for a configured back-end.
    ///
    /// A missing record is treated as zero usage.
    pub fn compute(config: &BackendConfig, record: Option<&UsageRecord>) -> Self {
        let used = record.map_or(0, |r| r.used);
        let remaining = config.monthly_quota.saturating_sub(used);
        Self {
            backend_id: config.id.clone(),
            quota: config.monthly_quota,
            used,
            remaining,
            is_exhausted: remaining < config.cost_per_search,
        }
    }

    /// Percentage of the quota used (0-100), for display.
    pub fn used_percent(&self) -> f64 {
        if self.quota == 0 {
            return 100.0;
        }
        (self.used as f64 / self.quota as f64 * 100.0).min(100.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_record_is_current_month() {
        let record = UsageRecord::fresh();
        assert_eq!(record.used, 0);
        assert_eq!(record.reset_month().unwrap(), current_month_key());
        assert!(!record.needs_reset(&current_month_key()));
    }

    #[test]
    fn test_prior_month_needs_reset() {
        let record = UsageRecord {
            used: 42,
            last_reset: "2024-01-31T23:59:59+00:00".to_string(),
        };
        assert_eq!(record.reset_month().unwrap(), "2024-01");
        assert!(record.needs_reset("2024-02"));
        assert!(!record.needs_reset("2024-01"));
    }

    #[test]
    fn test_malformed_timestamp_forces_reset() {
        let record = UsageRecord {
            used: 7,
            last_reset: "not-a-timestamp".to_string(),
        };
        assert!(record.reset_month().is_none());
        assert!(record.needs_reset(&current_month_key()));
    }

    #[test]
    fn test_reset_zeroes_usage() {
        let mut record = UsageRecord {
            used: 99,
            last_reset: "2020-06-01T00:00:00+00:00".to_string(),
        };
        record.reset();
        assert_eq!(record.used, 0);
        assert_eq!(record.reset_month().unwrap(), current_month_key());
    }

    #[test]
    fn test_snapshot_math() {
        let cfg = BackendConfig::new("brave", 10, 3);
        let record = UsageRecord {
            used: 9,
            last_reset: Utc::now().to_rfc3339(),
        };

        let snap = CreditSnapshot::compute(&cfg, Some(&record));
        assert_eq!(snap.remaining, 1);
        assert!(snap.is_exhausted, "1 remaining < cost 3");
    }

    #[test]
    fn test_snapshot_overspend_clamps_to_zero() {
        let cfg = BackendConfig::new("brave", 10, 1);
        let record = UsageRecord {
            used: 15,
            last_reset: Utc::now().to_rfc3339(),
        };

        let snap = CreditSnapshot::compute(&cfg, Some(&record));
        assert_eq!(snap.remaining, 0);
        assert!(snap.is_exhausted);
    }

    #[test]
    fn test_snapshot_missing_record_is_unused() {
        let cfg = BackendConfig::new("brave", 10, 3);
        let snap = CreditSnapshot::compute(&cfg, None);
        assert_eq!(snap.used, 0);
        assert_eq!(snap.remaining, 10);
        assert!(!snap.is_exhausted);
    }
}
