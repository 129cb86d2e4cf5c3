//! Trait definitions for searchfan.
//!
//! These are the seams between the core components and their collaborators:
//! back-end adapters implement [`SearchBackend`], persistence implementations
//! provide [`UsageStateStore`].

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{CoreError, SearchError};
use crate::models::{SearchQuery, SearchResponse, UsageRecord};

/// The uniform search capability every back-end adapter implements.
///
/// New back-ends are added by implementing this trait and registering an
/// instance; the execution strategies never special-case individual
/// back-ends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// The stable back-end identifier, matching its `BackendConfig`.
    fn id(&self) -> &str;

    /// Executes one search against this back-end.
    ///
    /// Implementations map their transport/API failures onto the
    /// [`SearchError`] taxonomy; they do not retry internally. Retry and
    /// timeout policy belongs to the calling strategy.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;
}

/// Persistence collaborator for the quota ledger.
///
/// Usage state is read and written as a complete snapshot keyed by
/// back-end id; there is no incremental format. A missing or empty state
/// means "no usage yet" and must not be reported as an error.
#[async_trait]
pub trait UsageStateStore: Send + Sync {
    /// Loads the persisted usage snapshot.
    async fn load_state(&self) -> Result<HashMap<String, UsageRecord>, CoreError>;

    /// Writes the full usage snapshot.
    async fn save_state(&self, state: &HashMap<String, UsageRecord>) -> Result<(), CoreError>;

    /// Returns true if a persisted snapshot exists.
    async fn state_exists(&self) -> bool;
}
