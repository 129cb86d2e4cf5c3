// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # SearchFan Engine
//!
//! Execution strategies and process lifecycle supervision for the SearchFan
//! federated search application.
//!
//! ## Execution Strategies
//!
//! A strategy fans one query out over a set of back-ends, under the quota
//! ledger's credit gate, bounded concurrency, per-request timeouts, and
//! bounded retry:
//!
//! - [`strategy::SearchStrategy`] - Trait for fan-out policies
//! - [`all_providers::AllProvidersStrategy`] - Call every eligible back-end
//! - [`first_success::FirstSuccessStrategy`] - Stop at the first success
//! - [`context::ExecutionContext`] - Registry and ledger handed to strategies
//!
//! ## Lifecycle Supervision
//!
//! The [`supervisor`] module drives a process-managed local service
//! (start, health wait, probing, stop) through an explicit state machine.
//! The [`host`] module holds its collaborators: subprocess execution,
//! compose-backed process control, and HTTP health probes.
//!
//! ## Example
//!
//! ```ignore
//! use searchfan_engine::{ExecutionContext, ExecutionOptions, StrategyKind};
//!
//! let ctx = ExecutionContext::new(registry, ledger);
//! let strategy = StrategyKind::All.build();
//! let outcome = strategy
//!     .execute(&query, &backend_ids, &ExecutionOptions::default(), &ctx)
//!     .await?;
//! ```

// Core modules
pub mod all_providers;
pub mod context;
mod dispatch;
pub mod error;
pub mod first_success;
pub mod host;
pub mod retry;
pub mod strategy;
pub mod supervisor;

// Re-export key types at crate root

// Errors
pub use error::{EngineError, LedgerError, ProcessError, SupervisorError};

// Strategies
pub use all_providers::AllProvidersStrategy;
pub use context::{BackendRegistry, ExecutionContext, ExecutionOptions};
pub use first_success::FirstSuccessStrategy;
pub use retry::RetryPolicy;
pub use strategy::{SearchStrategy, StrategyKind};

// Supervision
pub use host::{ComposeControl, HealthProbe, HttpHealthProbe, ProcessControl, ProcessRunner};
pub use supervisor::{LifecycleSupervisor, ServiceConfig, ValidationReport};
