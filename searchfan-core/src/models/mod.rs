//! Domain models for `searchfan`.
//!
//! This module contains all domain types:
//! - [`backend`] - static back-end configuration
//! - [`usage`] - usage records and derived credit snapshots
//! - [`result`] - queries, result items, and strategy outcomes
//! - [`lifecycle`] - supervised-process state

pub mod backend;
pub mod lifecycle;
pub mod result;
pub mod usage;

pub use backend::BackendConfig;
pub use lifecycle::{LifecycleState, ProcessStatus};
pub use result::{EngineAttempt, ResultItem, SearchQuery, SearchResponse, StrategyResult};
pub use usage::{current_month_key, CreditSnapshot, UsageRecord};
