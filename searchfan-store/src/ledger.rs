//! Quota ledger: per-back-end credit gating and accounting.
//!
//! The ledger is pure in-memory accounting over a loaded persisted
//! snapshot. It performs no I/O itself; persistence goes through the
//! injected [`UsageStateStore`]. Check and charge are split so strategies
//! can pre-check cheaply and only pay the persistence cost on an actual
//! successful charge.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use searchfan_core::{
    current_month_key, BackendConfig, CreditSnapshot, UsageRecord, UsageStateStore,
};

use crate::error::LedgerError;

// ============================================================================
// Inner State
// ============================================================================

/// Mutable ledger state, serialized behind one mutex so two concurrent
/// charges for the same back-end can never both pass the sufficiency check.
struct LedgerInner {
    initialized: bool,
    records: HashMap<String, UsageRecord>,
}

// ============================================================================
// Quota Ledger
// ============================================================================

/// Gates and accounts for per-back-end usage against a monthly quota.
pub struct QuotaLedger {
    configs: HashMap<String, BackendConfig>,
    store: Arc<dyn UsageStateStore>,
    inner: Mutex<LedgerInner>,
}

impl QuotaLedger {
    /// Creates a ledger over the configured back-ends and a persistence
    /// collaborator. [`initialize`](Self::initialize) must run before any
    /// charge.
    pub fn new(configs: Vec<BackendConfig>, store: Arc<dyn UsageStateStore>) -> Self {
        let configs = configs.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            configs,
            store,
            inner: Mutex::new(LedgerInner {
                initialized: false,
                records: HashMap::new(),
            }),
        }
    }

    /// Loads the persisted snapshot and applies the monthly reset check.
    ///
    /// For every configured back-end this either creates a fresh zero-usage
    /// record or resets an existing one whose `last_reset` month differs
    /// from the current calendar month (`YYYY-MM`). The possibly modified
    /// snapshot is written back. Idempotent: calling it again in the same
    /// month produces an identical snapshot.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), LedgerError> {
        let month = current_month_key();
        let mut inner = self.inner.lock().await;

        let mut records = self.store.load_state().await?;

        for id in self.configs.keys() {
            match records.get_mut(id) {
                Some(record) if record.needs_reset(&month) => {
                    info!(backend = %id, month = %month, "Monthly quota reset");
                    record.reset();
                }
                Some(_) => {}
                None => {
                    debug!(backend = %id, "Creating fresh usage record");
                    records.insert(id.clone(), UsageRecord::fresh());
                }
            }
        }

        self.store.save_state(&records).await?;

        inner.records = records;
        inner.initialized = true;
        debug!(backends = self.configs.len(), "Ledger initialized");
        Ok(())
    }

    /// Returns true if the back-end can afford one more search.
    ///
    /// A back-end with no usage record yet counts as unused.
    pub async fn has_sufficient_credits(&self, backend_id: &str) -> Result<bool, LedgerError> {
        let config = self.config(backend_id)?;
        let inner = self.inner.lock().await;

        Ok(match inner.records.get(backend_id) {
            None => true,
            Some(record) => record.used + config.cost_per_search <= config.monthly_quota,
        })
    }

    /// Charges one search in memory only.
    ///
    /// Returns true and increments `used` by `cost_per_search` if credits
    /// suffice; otherwise leaves state unchanged and returns false. Callers
    /// decide whether to persist (see
    /// [`charge_and_persist`](Self::charge_and_persist)).
    pub async fn charge(&self, backend_id: &str) -> Result<bool, LedgerError> {
        let mut inner = self.inner.lock().await;
        self.charge_locked(&mut inner, backend_id)
    }

    /// Charges one search and, only on success, writes the full snapshot
    /// through the persistence collaborator before returning.
    ///
    /// The lock is held across the write so a concurrent charge cannot
    /// observe the pre-charge balance.
    pub async fn charge_and_persist(&self, backend_id: &str) -> Result<bool, LedgerError> {
        let mut inner = self.inner.lock().await;
        let charged = self.charge_locked(&mut inner, backend_id)?;

        if charged {
            self.store.save_state(&inner.records).await?;
            debug!(backend = %backend_id, "Charge persisted");
        }

        Ok(charged)
    }

    /// Returns the credit snapshot for one back-end. Pure read.
    pub async fn snapshot(&self, backend_id: &str) -> Result<CreditSnapshot, LedgerError> {
        let config = self.config(backend_id)?;
        let inner = self.inner.lock().await;
        Ok(CreditSnapshot::compute(config, inner.records.get(backend_id)))
    }

    /// Returns credit snapshots for every configured back-end, sorted by id.
    pub async fn all_snapshots(&self) -> Vec<CreditSnapshot> {
        let inner = self.inner.lock().await;
        let mut snapshots: Vec<_> = self
            .configs
            .values()
            .map(|config| CreditSnapshot::compute(config, inner.records.get(&config.id)))
            .collect();
        snapshots.sort_by(|a, b| a.backend_id.cmp(&b.backend_id));
        snapshots
    }

    /// Ids of all configured back-ends, sorted.
    pub fn backend_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.configs.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn config(&self, backend_id: &str) -> Result<&BackendConfig, LedgerError> {
        self.configs
            .get(backend_id)
            .ok_or_else(|| LedgerError::UnknownBackend(backend_id.to_string()))
    }

    fn charge_locked(
        &self,
        inner: &mut LedgerInner,
        backend_id: &str,
    ) -> Result<bool, LedgerError> {
        let config = self.config(backend_id)?;

        if !inner.initialized {
            return Err(LedgerError::NoUsageRecord(backend_id.to_string()));
        }

        // Records for configured back-ends exist after initialize(); create
        // lazily for a back-end first observed mid-month.
        let record = inner
            .records
            .entry(backend_id.to_string())
            .or_insert_with(UsageRecord::fresh);

        if record.used + config.cost_per_search > config.monthly_quota {
            warn!(
                backend = %backend_id,
                used = record.used,
                quota = config.monthly_quota,
                "Charge refused, quota exhausted"
            );
            return Ok(false);
        }

        record.used += config.cost_per_search;
        debug!(backend = %backend_id, used = record.used, "Charged");
        Ok(true)
    }
}

impl std::fmt::Debug for QuotaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaLedger")
            .field("backends", &self.configs.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    fn ledger_with(
        configs: Vec<BackendConfig>,
        store: MemoryStateStore,
    ) -> (QuotaLedger, Arc<MemoryStateStore>) {
        let store = Arc::new(store);
        let ledger = QuotaLedger::new(configs, store.clone());
        (ledger, store)
    }

    #[tokio::test]
    async fn test_charge_before_initialize_fails() {
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 10, 1)],
            MemoryStateStore::new(),
        );

        let err = ledger.charge("brave").await.unwrap_err();
        assert!(matches!(err, LedgerError::NoUsageRecord(_)));
    }

    #[tokio::test]
    async fn test_unknown_backend_fails() {
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 10, 1)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        assert!(matches!(
            ledger.has_sufficient_credits("nope").await.unwrap_err(),
            LedgerError::UnknownBackend(_)
        ));
        assert!(matches!(
            ledger.charge("nope").await.unwrap_err(),
            LedgerError::UnknownBackend(_)
        ));
    }

    #[tokio::test]
    async fn test_charge_increments_by_cost() {
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 100, 5)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        assert!(ledger.has_sufficient_credits("brave").await.unwrap());
        assert!(ledger.charge("brave").await.unwrap());

        let snap = ledger.snapshot("brave").await.unwrap();
        assert_eq!(snap.used, 5);
        assert_eq!(snap.remaining, 95);
    }

    #[tokio::test]
    async fn test_insufficient_charge_leaves_state_unchanged() {
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 4, 5)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        assert!(!ledger.has_sufficient_credits("brave").await.unwrap());
        assert!(!ledger.charge("brave").await.unwrap());

        let snap = ledger.snapshot("brave").await.unwrap();
        assert_eq!(snap.used, 0, "no partial charge");
    }

    #[tokio::test]
    async fn test_quota_exhaustion_scenario() {
        // quota=10, cost=3: three charges land at used=9, remaining=1,
        // exhausted (1 < 3); the fourth charge is refused.
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 10, 3)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        for _ in 0..3 {
            assert!(ledger.charge("brave").await.unwrap());
        }

        let snap = ledger.snapshot("brave").await.unwrap();
        assert_eq!(snap.used, 9);
        assert_eq!(snap.remaining, 1);
        assert!(snap.is_exhausted);

        assert!(!ledger.charge("brave").await.unwrap());
        assert_eq!(ledger.snapshot("brave").await.unwrap().used, 9);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (ledger, store) = ledger_with(
            vec![BackendConfig::new("brave", 10, 1)],
            MemoryStateStore::new(),
        );

        ledger.initialize().await.unwrap();
        ledger.charge_and_persist("brave").await.unwrap();
        let first = store.saved().await.unwrap();

        ledger.initialize().await.unwrap();
        let second = store.saved().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_month_rollover_resets_record() {
        let mut seeded = HashMap::new();
        seeded.insert(
            "brave".to_string(),
            UsageRecord {
                used: 42,
                last_reset: "2020-01-15T12:00:00+00:00".to_string(),
            },
        );

        let (ledger, store) = ledger_with(
            vec![BackendConfig::new("brave", 100, 1)],
            MemoryStateStore::with_state(seeded),
        );
        ledger.initialize().await.unwrap();

        let snap = ledger.snapshot("brave").await.unwrap();
        assert_eq!(snap.used, 0, "prior-month record resets to zero");

        // The reset snapshot is written back.
        let saved = store.saved().await.unwrap();
        assert_eq!(saved.get("brave").unwrap().used, 0);
        assert_eq!(
            saved.get("brave").unwrap().reset_month().unwrap(),
            current_month_key()
        );
    }

    #[tokio::test]
    async fn test_malformed_last_reset_forces_reset() {
        let mut seeded = HashMap::new();
        seeded.insert(
            "brave".to_string(),
            UsageRecord {
                used: 9,
                last_reset: "garbage".to_string(),
            },
        );

        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 100, 1)],
            MemoryStateStore::with_state(seeded),
        );
        ledger.initialize().await.unwrap();

        assert_eq!(ledger.snapshot("brave").await.unwrap().used, 0);
    }

    #[tokio::test]
    async fn test_charge_and_persist_writes_snapshot() {
        let (ledger, store) = ledger_with(
            vec![BackendConfig::new("brave", 10, 3)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        assert!(ledger.charge_and_persist("brave").await.unwrap());
        let saved = store.saved().await.unwrap();
        assert_eq!(saved.get("brave").unwrap().used, 3);

        // A refused charge does not write.
        ledger.charge_and_persist("brave").await.unwrap();
        ledger.charge_and_persist("brave").await.unwrap();
        assert!(!ledger.charge_and_persist("brave").await.unwrap());
        let saved = store.saved().await.unwrap();
        assert_eq!(saved.get("brave").unwrap().used, 9);
    }

    #[tokio::test]
    async fn test_concurrent_charges_never_overspend() {
        let (ledger, _) = ledger_with(
            vec![BackendConfig::new("brave", 10, 3)],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();
        let ledger = Arc::new(ledger);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(
                async move { ledger.charge("brave").await.unwrap() },
            ));
        }

        let mut granted = 0;
        for h in handles {
            if h.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, 3, "only three charges fit in quota 10 at cost 3");
        assert_eq!(ledger.snapshot("brave").await.unwrap().used, 9);
    }

    #[tokio::test]
    async fn test_all_snapshots_sorted() {
        let (ledger, _) = ledger_with(
            vec![
                BackendConfig::new("zeta", 10, 1),
                BackendConfig::new("alpha", 10, 1),
            ],
            MemoryStateStore::new(),
        );
        ledger.initialize().await.unwrap();

        let snaps = ledger.all_snapshots().await;
        assert_eq!(snaps[0].backend_id, "alpha");
        assert_eq!(snaps[1].backend_id, "zeta");
    }
}
