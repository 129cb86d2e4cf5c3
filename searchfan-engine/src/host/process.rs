//! Subprocess execution and process control for supervised services.
//!
//! [`ProcessRunner`] runs external commands with a timeout and captured
//! output. [`ProcessControl`] is the seam the lifecycle supervisor drives;
//! [`ComposeControl`] implements it on top of `docker compose`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use searchfan_core::ProcessStatus;

use crate::error::ProcessError;

/// Default command timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Process Output
// ============================================================================

/// Output from a process execution.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output content.
    pub stdout: String,
    /// Standard error content.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// How long the command took to execute.
    pub duration: Duration,
}

impl ProcessOutput {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the stdout if successful, otherwise an error.
    pub fn stdout_if_success(&self) -> Result<&str, ProcessError> {
        if self.success() {
            Ok(&self.stdout)
        } else {
            Err(ProcessError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr.clone(),
            })
        }
    }
}

// ============================================================================
// Process Runner
// ============================================================================

/// API for running subprocesses (container tooling, local services).
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    pub fn new() -> Self {
        Self
    }

    /// Run a command and capture output.
    #[instrument(skip(self), fields(cmd = %cmd))]
    pub async fn run(&self, cmd: &str, args: &[&str]) -> Result<ProcessOutput, ProcessError> {
        self.run_with_timeout(cmd, args, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .await
    }

    /// Run a command with timeout.
    #[instrument(skip(self), fields(cmd = %cmd, timeout = ?timeout))]
    pub async fn run_with_timeout(
        &self,
        cmd: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(args = ?args, "Running command");

        let cmd_path = self.which(cmd).ok_or_else(|| {
            warn!(cmd = %cmd, "Command not found");
            ProcessError::NotFound(cmd.to_string())
        })?;

        let start = Instant::now();

        let mut command = Command::new(&cmd_path);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(cmd = %cmd, timeout = ?timeout, "Command timed out");
                return Err(ProcessError::Timeout(timeout));
            }
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            duration,
        };

        debug!(
            exit_code = exit_code,
            duration = ?duration,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "Command completed"
        );

        Ok(result)
    }

    /// Check if a command exists on PATH.
    pub fn command_exists(&self, cmd: &str) -> bool {
        self.which(cmd).is_some()
    }

    /// Find the path to a command.
    pub fn which(&self, cmd: &str) -> Option<PathBuf> {
        which::which(cmd).ok()
    }
}

// ============================================================================
// Process Control
// ============================================================================

/// Start/stop/status seam the lifecycle supervisor drives.
///
/// `start` and `stop` are requests, not guarantees: readiness is always
/// decided by the health probe, and `status` only reports process-level
/// existence.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Issues the start command for the service.
    async fn start(&self) -> Result<(), ProcessError>;

    /// Issues the stop command for the service.
    async fn stop(&self) -> Result<(), ProcessError>;

    /// Reports whether the underlying process/container is running.
    async fn status(&self) -> Result<ProcessStatus, ProcessError>;

    /// The host tool this control shells out to, for preflight validation.
    fn tool(&self) -> &str {
        "docker"
    }
}

// ============================================================================
// Compose Control
// ============================================================================

/// [`ProcessControl`] backed by `docker compose` against one service.
pub struct ComposeControl {
    runner: ProcessRunner,
    compose_file: PathBuf,
    service: String,
}

impl ComposeControl {
    /// Creates a control for one service in a compose file.
    pub fn new(compose_file: impl Into<PathBuf>, service: impl Into<String>) -> Self {
        Self {
            runner: ProcessRunner::new(),
            compose_file: compose_file.into(),
            service: service.into(),
        }
    }

    fn file_arg(&self) -> String {
        self.compose_file.display().to_string()
    }

    /// The compose file this control operates on.
    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }
}

#[async_trait]
impl ProcessControl for ComposeControl {
    #[instrument(skip(self), fields(service = %self.service))]
    async fn start(&self) -> Result<(), ProcessError> {
        let file = self.file_arg();
        let output = self
            .runner
            .run("docker", &["compose", "-f", &file, "up", "-d", &self.service])
            .await?;
        output.stdout_if_success()?;
        Ok(())
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn stop(&self) -> Result<(), ProcessError> {
        let file = self.file_arg();
        let output = self
            .runner
            .run("docker", &["compose", "-f", &file, "stop", &self.service])
            .await?;
        output.stdout_if_success()?;
        Ok(())
    }

    async fn status(&self) -> Result<ProcessStatus, ProcessError> {
        let file = self.file_arg();
        let output = self
            .runner
            .run(
                "docker",
                &[
                    "compose",
                    "-f",
                    &file,
                    "ps",
                    "--status",
                    "running",
                    "--services",
                ],
            )
            .await?;

        let running = output
            .stdout_if_success()?
            .lines()
            .any(|line| line.trim() == self.service);

        Ok(if running {
            ProcessStatus::Running
        } else {
            ProcessStatus::Stopped
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
