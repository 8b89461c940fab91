//! Restart supervision.
//!
//! After an uncaught failure the process announces a restart, waits a fixed
//! delay, and exits non-zero so an external process manager relaunches it.
//! The timer is armed at most once per process; later triggers are
//! suppressed because the process is already on its way out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::RestartConfig;
use crate::report::Report;
use crate::sink::ConsoleSink;

/// Ends the process once the restart delay has elapsed.
pub trait Terminator: Send + Sync {
    /// Terminate with `code`.
    fn terminate(&self, code: i32);
}

/// Exits the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Process-wide restart state. Never returns to `Idle` once scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartState {
    /// No restart has been requested.
    Idle,
    /// A restart timer is armed.
    Scheduled,
}

/// Result of a restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// This call armed the restart timer.
    Scheduled,
    /// A restart was already scheduled; nothing was done.
    Suppressed,
    /// Restarts are turned off in configuration.
    Disabled,
}

/// Decides whether and when to terminate the process for restart.
pub struct RestartSupervisor {
    scheduled: AtomicBool,
    enabled: bool,
    delay: Duration,
    exit_code: i32,
    identity: String,
    console: Option<Arc<ConsoleSink>>,
    terminator: Arc<dyn Terminator>,
}

impl RestartSupervisor {
    /// Create a supervisor that exits the process.
    pub fn new(config: &RestartConfig, identity: impl Into<String>) -> Self {
        Self::with_terminator(config, identity, Arc::new(ProcessExit))
    }

    /// Create a supervisor with a custom terminator.
    pub fn with_terminator(
        config: &RestartConfig,
        identity: impl Into<String>,
        terminator: Arc<dyn Terminator>,
    ) -> Self {
        Self {
            scheduled: AtomicBool::new(false),
            enabled: config.enabled,
            delay: Duration::from_secs(config.delay_secs),
            exit_code: config.exit_code,
            identity: identity.into(),
            console: None,
            terminator,
        }
    }

    /// Print the restart notice on `console` when a restart is scheduled.
    #[must_use]
    pub fn with_console(mut self, console: Arc<ConsoleSink>) -> Self {
        self.console = Some(console);
        self
    }

    /// Current restart state.
    pub fn state(&self) -> RestartState {
        if self.scheduled.load(Ordering::Acquire) {
            RestartState::Scheduled
        } else {
            RestartState::Idle
        }
    }

    /// Configured delay between the notice and process exit.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the restart timer for `report` unless one is already armed.
    ///
    /// Not gated on severity: every uncaught failure restarts the process.
    pub fn maybe_restart(&self, report: &Report) -> RestartDecision {
        if !self.enabled {
            info!(report_id = %report.id, "restart disabled, process keeps running");
            return RestartDecision::Disabled;
        }

        if self
            .scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!(report_id = %report.id, "restart already scheduled, suppressing");
            return RestartDecision::Suppressed;
        }

        warn!(
            report_id = %report.id,
            kind = %report.kind,
            severity = %report.severity,
            delay_secs = self.delay.as_secs(),
            "restart scheduled"
        );

        if let Some(console) = &self.console {
            if let Err(e) = console.announce_restart(&self.identity, self.delay) {
                warn!(error = %e, "failed to print restart notice");
            }
        }

        self.arm_timer();
        RestartDecision::Scheduled
    }

    fn arm_timer(&self) {
        let delay = self.delay;
        let code = self.exit_code;
        let terminator = Arc::clone(&self.terminator);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    info!(exit_code = code, "exiting for restart");
                    terminator.terminate(code);
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    terminator.terminate(code);
                });
            }
        }
    }
}
