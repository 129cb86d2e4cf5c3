//! Lifecycle supervision for a process-managed local search service.
//!
//! One [`LifecycleSupervisor`] owns the lifecycle state of one external
//! service (e.g. a compose-managed search container). It drives the
//! [`ProcessControl`] seam for start/stop/status and a [`HealthProbe`] for
//! readiness; it never inspects the service any other way.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use searchfan_core::{LifecycleState, ProcessStatus};
use searchfan_store::ServiceSettings;

use crate::error::SupervisorError;
use crate::host::{ComposeControl, HealthProbe, HttpHealthProbe, ProcessControl, ProcessRunner};

/// Delay between health probes while waiting for a started service.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// Service Config
// ============================================================================

/// Resolved supervision parameters for one service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Back-end id this service backs.
    pub backend_id: String,
    /// Compose file defining the service.
    pub compose_file: PathBuf,
    /// Service name inside the compose file.
    pub service: String,
    /// Health endpoint URL.
    pub health_url: String,
    /// Ports the service is expected to expose.
    pub ports: Vec<u16>,
    /// Whether `init` may issue a start command.
    pub auto_start: bool,
    /// Whether `shutdown` may issue a stop command.
    pub auto_stop: bool,
    /// Hard deadline for the whole init health wait.
    pub init_timeout: Duration,
    /// Delay between health probes during init.
    pub poll_interval: Duration,
}

impl ServiceConfig {
    /// Builds supervision parameters from persisted settings.
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self {
            backend_id: settings.backend_id.clone(),
            compose_file: settings.compose_file.clone(),
            service: settings.service.clone(),
            health_url: settings.health_url.clone(),
            ports: settings.ports.clone(),
            auto_start: settings.auto_start,
            auto_stop: settings.auto_stop,
            init_timeout: Duration::from_secs(settings.init_timeout_secs),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ============================================================================
// Validation Report
// ============================================================================

/// Outcome of a preflight configuration check.
///
/// Errors mean `init` cannot succeed as configured; warnings flag likely
/// misconfigurations that do not block startup.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationReport {
    /// True when no errors were found.
    pub valid: bool,
    /// Problems that will make init fail.
    pub errors: Vec<String>,
    /// Suspicious but non-fatal findings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

// ============================================================================
// Init Outcome
// ============================================================================

/// Terminal result of one coalesced init attempt, broadcast to all waiters.
#[derive(Debug, Clone)]
enum InitOutcome {
    Healthy,
    Unhealthy,
    StartFailed(String),
    TimedOut(Duration),
}

impl InitOutcome {
    fn final_state(&self) -> LifecycleState {
        match self {
            Self::Healthy => LifecycleState::Healthy,
            Self::Unhealthy => LifecycleState::Unhealthy,
            Self::StartFailed(_) | Self::TimedOut(_) => LifecycleState::Failed,
        }
    }

    fn into_result(self) -> Result<LifecycleState, SupervisorError> {
        match self {
            Self::Healthy => Ok(LifecycleState::Healthy),
            Self::Unhealthy => Ok(LifecycleState::Unhealthy),
            Self::StartFailed(message) => Err(SupervisorError::StartFailed(message)),
            Self::TimedOut(timeout) => Err(SupervisorError::InitializationTimeout(timeout)),
        }
    }
}

enum InitRole {
    Leader(watch::Sender<Option<InitOutcome>>),
    Follower(watch::Receiver<Option<InitOutcome>>),
}

// ============================================================================
// Lifecycle Supervisor
// ============================================================================

/// Supervises one external service through its lifecycle states.
///
/// Concurrent `init` calls coalesce: one caller leads the actual start/wait
/// sequence, the rest await the same broadcast outcome, and the start
/// command is issued at most once per attempt.
pub struct LifecycleSupervisor {
    config: ServiceConfig,
    control: Arc<dyn ProcessControl>,
    probe: Arc<dyn HealthProbe>,
    state: Mutex<LifecycleState>,
    inflight: Mutex<Option<watch::Receiver<Option<InitOutcome>>>>,
}

impl LifecycleSupervisor {
    /// Creates a supervisor over explicit control and probe collaborators.
    pub fn new(
        config: ServiceConfig,
        control: Arc<dyn ProcessControl>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            config,
            control,
            probe,
            state: Mutex::new(LifecycleState::Uninitialized),
            inflight: Mutex::new(None),
        }
    }

    /// Creates a compose-backed supervisor from persisted settings.
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        let config = ServiceConfig::from_settings(settings);
        let control = Arc::new(ComposeControl::new(&config.compose_file, &config.service));
        let probe = Arc::new(HttpHealthProbe::new(&config.health_url));
        Self::new(config, control, probe)
    }

    /// The service configuration this supervisor runs under.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Preflight check of a configuration against the given host tool.
    ///
    /// Pure inspection: issues no process commands and no probes.
    pub fn validate_config(config: &ServiceConfig, tool: &str) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.backend_id.trim().is_empty() {
            errors.push("backend_id is empty".to_string());
        }
        if config.service.trim().is_empty() {
            errors.push("service name is empty".to_string());
        }
        if !config.compose_file.exists() {
            errors.push(format!(
                "compose file not found: {}",
                config.compose_file.display()
            ));
        }
        match url::Url::parse(&config.health_url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            Ok(parsed) => errors.push(format!(
                "health_url scheme must be http or https, got {}",
                parsed.scheme()
            )),
            Err(error) => errors.push(format!("health_url is invalid: {error}")),
        }
        if config.init_timeout.is_zero() {
            errors.push("init timeout is zero".to_string());
        }

        if !ProcessRunner::new().command_exists(tool) {
            warnings.push(format!("host tool not found on PATH: {tool}"));
        }
        if config.ports.is_empty() {
            warnings.push("no ports declared for the service".to_string());
        }

        ValidationReport::from_findings(errors, warnings)
    }

    /// Validates this supervisor's own configuration.
    pub fn validate(&self) -> ValidationReport {
        Self::validate_config(&self.config, self.control.tool())
    }

    /// Reports process-level existence; errors degrade to `false`.
    pub async fn is_running(&self) -> bool {
        matches!(self.control.status().await, Ok(ProcessStatus::Running))
    }

    /// Brings the service to a ready state, coalescing concurrent callers.
    ///
    /// Already-ready states return immediately. Otherwise one caller runs
    /// the start/wait sequence under the hard init deadline while the rest
    /// wait for its broadcast outcome. `Unhealthy` is a successful init:
    /// the process is up even though the last probe failed.
    #[instrument(skip(self), fields(service = %self.config.service))]
    pub async fn init(&self) -> Result<LifecycleState, SupervisorError> {
        {
            let state = *self.state.lock().await;
            if state.is_ready() {
                debug!(state = %state, "Init skipped, already ready");
                return Ok(state);
            }
        }

        let role = {
            let mut inflight = self.inflight.lock().await;
            match inflight.as_ref() {
                Some(rx) => InitRole::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *inflight = Some(rx);
                    InitRole::Leader(tx)
                }
            }
        };

        match role {
            InitRole::Follower(mut rx) => {
                debug!("Joining in-flight init attempt");
                loop {
                    let outcome = rx.borrow().clone();
                    if let Some(outcome) = outcome {
                        return outcome.into_result();
                    }
                    if rx.changed().await.is_err() {
                        return Err(SupervisorError::InitInterrupted);
                    }
                }
            }
            InitRole::Leader(tx) => {
                let outcome = self.run_init().await;
                *self.state.lock().await = outcome.final_state();
                *self.inflight.lock().await = None;
                let _ = tx.send(Some(outcome.clone()));
                info!(state = %outcome.final_state(), "Init attempt finished");
                outcome.into_result()
            }
        }
    }

    /// The actual start/wait sequence, run by the init leader only.
    async fn run_init(&self) -> InitOutcome {
        if !self.config.auto_start {
            debug!("auto_start disabled, probing without starting");
            return if self.probe.check().await {
                InitOutcome::Healthy
            } else {
                InitOutcome::Unhealthy
            };
        }

        *self.state.lock().await = LifecycleState::Starting;

        match self.control.status().await {
            Ok(ProcessStatus::Running) => {
                debug!("Service process already running");
            }
            Ok(ProcessStatus::Stopped) => {
                info!("Issuing start command");
                if let Err(error) = self.control.start().await {
                    warn!(error = %error, "Start command failed");
                    return InitOutcome::StartFailed(error.to_string());
                }
            }
            Err(error) => {
                warn!(error = %error, "Status check failed");
                return InitOutcome::StartFailed(error.to_string());
            }
        }

        let wait_for_healthy = async {
            loop {
                if self.probe.check().await {
                    return;
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }
        };

        match tokio::time::timeout(self.config.init_timeout, wait_for_healthy).await {
            Ok(()) => InitOutcome::Healthy,
            Err(_) => {
                warn!(timeout = ?self.config.init_timeout, "Service never reported healthy");
                InitOutcome::TimedOut(self.config.init_timeout)
            }
        }
    }

    /// Probes a ready service, records the answer, and reports it. Never
    /// errors.
    ///
    /// Outside the ready states this is a no-op returning false: an
    /// uninitialized or stopped service has nothing to probe.
    pub async fn healthcheck(&self) -> bool {
        let current = *self.state.lock().await;
        if !current.is_ready() {
            return false;
        }

        let healthy = self.probe.check().await;

        let mut state = self.state.lock().await;
        // Re-check under the lock: a concurrent shutdown may have won.
        if state.is_ready() {
            *state = if healthy {
                LifecycleState::Healthy
            } else {
                LifecycleState::Unhealthy
            };
        }
        *state == LifecycleState::Healthy
    }

    /// Best-effort stop. Always lands in `Stopped`, even when the stop
    /// command fails or `auto_stop` forbids issuing one.
    ///
    /// A never-started service (still `Uninitialized`) skips the stop
    /// command entirely. A `Failed` service still gets one: a timed-out
    /// init may have left the process running.
    #[instrument(skip(self), fields(service = %self.config.service))]
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if *state == LifecycleState::Stopped {
            return;
        }

        if *state == LifecycleState::Uninitialized {
            debug!("Service was never started, nothing to stop");
            *state = LifecycleState::Stopped;
            return;
        }

        if self.config.auto_stop {
            *state = LifecycleState::ShuttingDown;
            info!("Issuing stop command");
            if let Err(error) = self.control.stop().await {
                warn!(error = %error, "Stop command failed, marking stopped anyway");
            }
        } else {
            debug!("auto_stop disabled, skipping stop command");
        }

        *state = LifecycleState::Stopped;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::error::ProcessError;

    struct MockControl {
        starts: AtomicUsize,
        stops: AtomicUsize,
        running: AtomicBool,
        start_delay: Duration,
    }

    impl MockControl {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                running: AtomicBool::new(false),
                start_delay: Duration::ZERO,
            })
        }

        fn with_start_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                running: AtomicBool::new(false),
                start_delay: delay,
            })
        }
    }

    #[async_trait]
    impl ProcessControl for MockControl {
        async fn start(&self) -> Result<(), ProcessError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.start_delay).await;
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), ProcessError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.running.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn status(&self) -> Result<ProcessStatus, ProcessError> {
            Ok(if self.running.load(Ordering::SeqCst) {
                ProcessStatus::Running
            } else {
                ProcessStatus::Stopped
            })
        }

        fn tool(&self) -> &str {
            "sh"
        }
    }

    struct MockProbe {
        healthy: AtomicBool,
    }

    impl MockProbe {
        fn healthy() -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(true),
            })
        }

        fn unhealthy() -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(false),
            })
        }

        fn set(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl HealthProbe for MockProbe {
        async fn check(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            backend_id: "local-meili".to_string(),
            compose_file: PathBuf::from("docker-compose.yml"),
            service: "meilisearch".to_string(),
            health_url: "http://127.0.0.1:7700/health".to_string(),
            ports: vec![7700],
            auto_start: true,
            auto_stop: true,
            init_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_init_starts_and_reports_healthy() {
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(test_config(), control.clone(), probe);

        let state = supervisor.init().await.unwrap();

        assert_eq!(state, LifecycleState::Healthy);
        assert_eq!(supervisor.state().await, LifecycleState::Healthy);
        assert_eq!(control.starts.load(Ordering::SeqCst), 1);
        assert!(supervisor.is_running().await);
    }

    #[tokio::test]
    async fn test_concurrent_init_issues_one_start() {
        let control = MockControl::with_start_delay(Duration::from_millis(50));
        let probe = MockProbe::healthy();
        let supervisor = Arc::new(LifecycleSupervisor::new(
            test_config(),
            control.clone(),
            probe,
        ));

        let a = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.init().await })
        };
        let b = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.init().await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        assert_eq!(a, LifecycleState::Healthy);
        assert_eq!(b, LifecycleState::Healthy);
        assert_eq!(
            control.starts.load(Ordering::SeqCst),
            1,
            "the start command must be issued at most once"
        );
    }

    #[tokio::test]
    async fn test_init_times_out_when_never_healthy() {
        let mut config = test_config();
        config.init_timeout = Duration::from_millis(150);
        let control = MockControl::new();
        let probe = MockProbe::unhealthy();
        let supervisor = LifecycleSupervisor::new(config, control, probe);

        let err = supervisor.init().await.unwrap_err();

        assert!(matches!(err, SupervisorError::InitializationTimeout(_)));
        assert_eq!(supervisor.state().await, LifecycleState::Failed);
    }

    #[tokio::test]
    async fn test_init_without_auto_start_only_probes() {
        let mut config = test_config();
        config.auto_start = false;
        let control = MockControl::new();
        let probe = MockProbe::unhealthy();
        let supervisor = LifecycleSupervisor::new(config, control.clone(), probe);

        let state = supervisor.init().await.unwrap();

        assert_eq!(state, LifecycleState::Unhealthy);
        assert_eq!(control.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_healthcheck_flips_between_ready_states() {
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(test_config(), control, probe.clone());

        supervisor.init().await.unwrap();
        assert!(supervisor.healthcheck().await);
        assert_eq!(supervisor.state().await, LifecycleState::Healthy);

        probe.set(false);
        assert!(!supervisor.healthcheck().await);
        assert_eq!(supervisor.state().await, LifecycleState::Unhealthy);

        probe.set(true);
        assert!(supervisor.healthcheck().await);
        assert_eq!(supervisor.state().await, LifecycleState::Healthy);
    }

    #[tokio::test]
    async fn test_healthcheck_before_init_is_a_no_op() {
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(test_config(), control, probe);

        assert!(!supervisor.healthcheck().await);
        assert_eq!(supervisor.state().await, LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn test_shutdown_stops_and_lands_in_stopped() {
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(test_config(), control.clone(), probe);

        supervisor.init().await.unwrap();
        supervisor.shutdown().await;

        assert_eq!(supervisor.state().await, LifecycleState::Stopped);
        assert_eq!(control.stops.load(Ordering::SeqCst), 1);

        // Idempotent: a second shutdown issues nothing.
        supervisor.shutdown().await;
        assert_eq!(control.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_of_never_started_service_issues_no_command() {
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(test_config(), control.clone(), probe);

        supervisor.shutdown().await;

        assert_eq!(supervisor.state().await, LifecycleState::Stopped);
        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_without_auto_stop_skips_the_command() {
        let mut config = test_config();
        config.auto_stop = false;
        let control = MockControl::new();
        let probe = MockProbe::healthy();
        let supervisor = LifecycleSupervisor::new(config, control.clone(), probe);

        supervisor.init().await.unwrap();
        supervisor.shutdown().await;

        assert_eq!(supervisor.state().await, LifecycleState::Stopped);
        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validate_config_flags_missing_compose_file() {
        let mut config = test_config();
        config.compose_file = PathBuf::from("/definitely/missing/compose.yml");

        let report = LifecycleSupervisor::validate_config(&config, "sh");

        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("compose file not found")));
    }

    #[test]
    fn test_validate_config_accepts_sane_settings() {
        let dir = tempfile::tempdir().unwrap();
        let compose = dir.path().join("docker-compose.yml");
        std::fs::write(&compose, "services: {}\n").unwrap();

        let mut config = test_config();
        config.compose_file = compose;

        let report = LifecycleSupervisor::validate_config(&config, "sh");

        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn test_validate_config_rejects_bad_health_url() {
        let mut config = test_config();
        config.health_url = "not a url".to_string();

        let report = LifecycleSupervisor::validate_config(&config, "sh");

        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("health_url")));
    }
}
