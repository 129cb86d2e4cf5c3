//! Usage state store implementations.
//!
//! [`JsonStateStore`] persists the full usage snapshot to one JSON file;
//! [`MemoryStateStore`] keeps it in memory for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use searchfan_core::{CoreError, UsageRecord, UsageStateStore};

use crate::persistence::{self, load_json, save_json};

// ============================================================================
// JSON File Store
// ============================================================================

/// File-backed usage state store.
///
/// The snapshot is a plain `backend id -> UsageRecord` map serialized as
/// JSON. Reads treat a missing file as an empty snapshot; writes replace
/// the file atomically.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Creates a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default platform data path.
    pub fn at_default_path() -> Self {
        Self::new(persistence::default_usage_state_path())
    }

    /// The file path this store reads and writes.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl UsageStateStore for JsonStateStore {
    async fn load_state(&self) -> Result<HashMap<String, UsageRecord>, CoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No usage state file, starting empty");
            return Ok(HashMap::new());
        }

        load_json(&self.path).await.map_err(|e| match e {
            crate::error::StoreError::Io(io) => CoreError::Io(io),
            crate::error::StoreError::Serialization(s) => CoreError::Serialization(s),
            crate::error::StoreError::Config(msg) => CoreError::InvalidConfig(msg),
        })
    }

    async fn save_state(&self, state: &HashMap<String, UsageRecord>) -> Result<(), CoreError> {
        save_json(&self.path, state).await.map_err(|e| match e {
            crate::error::StoreError::Io(io) => CoreError::Io(io),
            crate::error::StoreError::Serialization(s) => CoreError::Serialization(s),
            crate::error::StoreError::Config(msg) => CoreError::InvalidConfig(msg),
        })
    }

    async fn state_exists(&self) -> bool {
        self.path.exists()
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory usage state store.
///
/// Used by tests and by embedders that do not want cross-process
/// persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<Option<HashMap<String, UsageRecord>>>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with the given snapshot.
    pub fn with_state(state: HashMap<String, UsageRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// Returns a copy of the currently saved snapshot, if any.
    pub async fn saved(&self) -> Option<HashMap<String, UsageRecord>> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl UsageStateStore for MemoryStateStore {
    async fn load_state(&self) -> Result<HashMap<String, UsageRecord>, CoreError> {
        Ok(self.state.lock().await.clone().unwrap_or_default())
    }

    async fn save_state(&self, state: &HashMap<String, UsageRecord>) -> Result<(), CoreError> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }

    async fn state_exists(&self) -> bool {
        self.state.lock().await.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("usage.json"));

        assert!(!store.state_exists().await);
        let state = store.load_state().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("usage.json"));

        let mut state = HashMap::new();
        state.insert(
            "brave".to_string(),
            UsageRecord {
                used: 12,
                last_reset: "2026-08-01T00:00:00+00:00".to_string(),
            },
        );

        store.save_state(&state).await.unwrap();
        assert!(store.state_exists().await);

        let loaded = store.load_state().await.unwrap();
        assert_eq!(loaded.get("brave").unwrap().used, 12);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStateStore::new();
        assert!(!store.state_exists().await);

        let mut state = HashMap::new();
        state.insert("brave".to_string(), UsageRecord::fresh());
        store.save_state(&state).await.unwrap();

        assert!(store.state_exists().await);
        assert_eq!(store.load_state().await.unwrap().len(), 1);
    }
}
