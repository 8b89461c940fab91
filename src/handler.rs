//! Failure handling entry points.
//!
//! Each inbound failure runs the same pipeline: classify, resolve severity,
//! look up advisories, build the report, fan it out to the sinks, and for
//! uncaught failures ask the restart supervisor whether to exit.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;
use uuid::Uuid;

use crate::classify::{is_filesystem_code, FailureKind};
use crate::config::CrashwatchConfig;
use crate::dispatch::{reporting_scope, DispatchOutcome, Dispatcher};
use crate::error::SinkError;
use crate::failure::RawFailure;
use crate::host::HostSnapshot;
use crate::report::{self, FailureSource, Report};
use crate::severity::Severity;
use crate::sink::{ConsoleSink, FileSink, Sink, WebhookSink};
use crate::supervisor::{RestartDecision, RestartSupervisor};

/// What happened to one observed failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    /// Identifier of the report that was built.
    pub report_id: Uuid,
    /// Classified kind.
    pub kind: FailureKind,
    /// Resolved severity.
    pub severity: Severity,
    /// Per-sink delivery result.
    pub outcome: DispatchOutcome,
    /// Restart decision, for sources that consult the supervisor.
    pub restart: Option<RestartDecision>,
}

/// Runs the reporting pipeline for every failure source.
pub struct FailureHandler {
    dispatcher: Dispatcher,
    supervisor: RestartSupervisor,
    host_probe: fn() -> HostSnapshot,
}

impl FailureHandler {
    /// Create a handler from its parts.
    pub fn new(dispatcher: Dispatcher, supervisor: RestartSupervisor) -> Self {
        Self {
            dispatcher,
            supervisor,
            host_probe: HostSnapshot::capture,
        }
    }

    /// Build the standard handler: stdio console, failure log, optional
    /// webhook, and a supervisor that exits the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook HTTP client cannot be built.
    pub fn from_config(config: &CrashwatchConfig) -> Result<Self, SinkError> {
        let console = Arc::new(ConsoleSink::stdio());

        let mut sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(FileSink::new(config.log.path.clone()))];
        if let Some(url) = config.notifier.webhook_url.as_deref() {
            sinks.push(Arc::new(WebhookSink::new(
                url,
                config.notifier.username.clone(),
                config.identity.avatar_url.clone(),
                config.identity.name.clone(),
                Duration::from_secs(config.notifier.timeout_secs),
            )?));
        }

        let supervisor = RestartSupervisor::new(&config.restart, config.identity.name.clone())
            .with_console(Arc::clone(&console));

        Ok(Self::new(Dispatcher::new(console, sinks), supervisor))
    }

    /// Replace the host snapshot source.
    #[must_use]
    pub fn with_host_probe(mut self, probe: fn() -> HostSnapshot) -> Self {
        self.host_probe = probe;
        self
    }

    /// The dispatcher reports are delivered through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The restart supervisor.
    pub fn supervisor(&self) -> &RestartSupervisor {
        &self.supervisor
    }

    /// A panic reached the process-wide hook. Always consults the supervisor.
    pub async fn on_uncaught_exception(&self, failure: &RawFailure) -> Handled {
        self.handle(FailureSource::UncaughtException, failure).await
    }

    /// A supervised task resolved to an error. Always consults the supervisor.
    pub async fn on_unhandled_rejection(&self, reason: &RawFailure, context: &str) -> Handled {
        let source = FailureSource::UnhandledRejection {
            context: context.to_owned(),
        };
        self.handle(source, reason).await
    }

    /// The chat client emitted an error event.
    pub async fn on_client_error(&self, failure: &RawFailure) -> Handled {
        self.handle(FailureSource::ClientError, failure).await
    }

    /// One of the client's shards emitted an error event.
    pub async fn on_shard_error(&self, failure: &RawFailure, shard_id: u32) -> Handled {
        self.handle(FailureSource::ShardError { shard_id }, failure)
            .await
    }

    /// Monitor pass over an uncaught failure: only filesystem failures
    /// (`ENOENT`, `EACCES`) are reported here, in addition to the regular
    /// uncaught-exception report.
    pub async fn on_uncaught_exception_observed(&self, failure: &RawFailure) -> Option<Handled> {
        if !is_filesystem_code(failure) {
            return None;
        }
        Some(self.handle(FailureSource::FilesystemMonitor, failure).await)
    }

    /// Build the report for `failure` without delivering it.
    pub fn build_report(&self, source: FailureSource, failure: &RawFailure) -> Report {
        report::build(source, failure, (self.host_probe)())
    }

    async fn handle(&self, source: FailureSource, failure: &RawFailure) -> Handled {
        reporting_scope(self.run_pipeline(source, failure)).await
    }

    async fn run_pipeline(&self, source: FailureSource, failure: &RawFailure) -> Handled {
        error!(source = %source, message = %failure.summary(), "failure observed");

        let report = Arc::new(self.build_report(source, failure));
        let outcome = self.dispatcher.dispatch(Arc::clone(&report)).await;

        let restart = report
            .source
            .restarts_process()
            .then(|| self.supervisor.maybe_restart(&report));

        Handled {
            report_id: report.id,
            kind: report.kind,
            severity: report.severity,
            outcome,
            restart,
        }
    }
}
