// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `searchfan` Store
//!
//! Persistence and quota accounting for `searchfan`.
//!
//! - [`QuotaLedger`] - in-memory credit gating over a persisted snapshot
//! - [`JsonStateStore`] / [`MemoryStateStore`] - usage state persistence
//! - [`AppConfig`] - application configuration
//! - [`persistence`] - atomic JSON file helpers and default paths

pub mod config;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod state;

pub use config::{AppConfig, EngineConfig, ServiceSettings};
pub use error::{LedgerError, StoreError};
pub use ledger::QuotaLedger;
pub use state::{JsonStateStore, MemoryStateStore};
