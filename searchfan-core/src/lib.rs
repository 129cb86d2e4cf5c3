// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `searchfan` Core
//!
//! Core types, models, and traits for `searchfan`, a federated search
//! front-end that fans queries out across several independent search
//! back-ends under per-back-end monthly quotas.
//!
//! This crate provides the foundational abstractions used across all other
//! `searchfan` crates:
//!
//! - Domain models (back-end configs, usage records, results, lifecycle)
//! - Error types
//! - Trait seams for back-end adapters and usage persistence
//!
//! ## Key Types
//!
//! ### Configuration & Accounting
//! - [`BackendConfig`] - static per-back-end settings
//! - [`UsageRecord`] - persisted per-back-end usage state
//! - [`CreditSnapshot`] - derived credit view
//!
//! ### Queries & Results
//! - [`SearchQuery`] - query handed to a back-end
//! - [`ResultItem`] / [`SearchResponse`] - normalized hits
//! - [`EngineAttempt`] / [`StrategyResult`] - per-execution outcome
//!
//! ### Lifecycle
//! - [`LifecycleState`] - state of one supervised local service
//!
//! ### Seams
//! - [`SearchBackend`] - the uniform search capability
//! - [`UsageStateStore`] - snapshot persistence for the quota ledger

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::{CoreError, SearchError};

// Re-export all model types
pub use models::{
    current_month_key,
    BackendConfig,
    CreditSnapshot,
    EngineAttempt,
    LifecycleState,
    ProcessStatus,
    ResultItem,
    SearchQuery,
    SearchResponse,
    StrategyResult,
    UsageRecord,
};

// Re-export traits
pub use traits::{SearchBackend, UsageStateStore};
