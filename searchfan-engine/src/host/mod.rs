//! Host integration: subprocess execution and health probing.
//!
//! - [`process`] - subprocess runner and the compose-backed process control
//! - [`probe`] - HTTP health probing

pub mod probe;
pub mod process;

pub use probe::{HealthProbe, HttpHealthProbe};
pub use process::{ComposeControl, ProcessControl, ProcessOutput, ProcessRunner};
