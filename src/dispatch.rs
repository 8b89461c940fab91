//! Fan-out of a report to every configured sink.
//!
//! The console is written first and synchronously. Every other sink runs as
//! its own task, so a slow or failing sink never holds up the rest. Sink
//! errors and panics are traced, echoed on the console error stream, and go
//! no further: they are never fed back into the reporting pipeline.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::report::Report;
use crate::sink::{ConsoleSink, Sink};

tokio::task_local! {
    static REPORTING: ();
}

/// Run `future` marked as part of the reporting pipeline.
pub(crate) async fn reporting_scope<F: Future>(future: F) -> F::Output {
    REPORTING.scope((), future).await
}

/// Whether the current task is running inside the reporting pipeline.
///
/// The panic hook checks this so a panicking sink is logged, not reported.
pub fn in_reporting_pipeline() -> bool {
    REPORTING.try_with(|_| ()).is_ok()
}

/// Which sinks accepted a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Sinks that delivered the report.
    pub delivered: Vec<String>,
    /// Sinks that failed or panicked.
    pub failed: Vec<String>,
}

impl DispatchOutcome {
    /// Whether every attempted sink delivered.
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers reports to the console and a set of asynchronous sinks.
pub struct Dispatcher {
    console: Arc<ConsoleSink>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Dispatcher {
    /// Create a dispatcher. The console is always attempted.
    pub fn new(console: Arc<ConsoleSink>, sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { console, sinks }
    }

    /// Console used for report blocks and lifecycle banners.
    pub fn console(&self) -> &Arc<ConsoleSink> {
        &self.console
    }

    /// Names of the asynchronous sinks, in registration order.
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_owned()).collect()
    }

    /// Deliver `report` to every sink and wait for all of them to settle.
    pub async fn dispatch(&self, report: Arc<Report>) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        let console_name = self.console.name().to_owned();
        match self.console.deliver(&report).await {
            Ok(()) => outcome.delivered.push(console_name),
            Err(e) => {
                warn!(report_id = %report.id, error = %e, "console sink failed");
                outcome.failed.push(console_name);
            }
        }

        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let report = Arc::clone(&report);
            let name = sink.name().to_owned();
            let handle = tasks.spawn(reporting_scope(async move { sink.deliver(&report).await }));
            names.insert(handle.id(), name);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(()))) => {
                    let name = names.remove(&id).unwrap_or_default();
                    debug!(report_id = %report.id, sink = %name, "report delivered");
                    outcome.delivered.push(name);
                }
                Ok((id, Err(e))) => {
                    let name = names.remove(&id).unwrap_or_default();
                    error!(report_id = %report.id, sink = %name, error = %e, "sink delivery failed");
                    self.note_failure(&report, &name, &e.to_string());
                    outcome.failed.push(name);
                }
                Err(e) => {
                    let name = names.remove(&e.id()).unwrap_or_default();
                    error!(report_id = %report.id, sink = %name, error = %e, "sink task aborted");
                    self.note_failure(&report, &name, &e.to_string());
                    outcome.failed.push(name);
                }
            }
        }

        outcome
    }

    fn note_failure(&self, report: &Report, sink: &str, reason: &str) {
        if let Err(e) = self.console.print_sink_failure(report, sink, reason) {
            warn!(report_id = %report.id, error = %e, "console sink failed");
        }
    }
}
