//! Process-wide failure hooks.
//!
//! [`install`] registers a single panic hook for the lifetime of the process.
//! Panics become uncaught-exception reports; [`spawn_supervised`] turns a
//! task that resolves to `Err` into an unhandled-rejection report.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::dispatch::in_reporting_pipeline;
use crate::error::HookError;
use crate::failure::RawFailure;
use crate::handler::{FailureHandler, Handled};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the process-wide panic hook. Must be called from within a tokio
/// runtime; reports are processed on that runtime.
///
/// The previously installed hook still runs first. Each panic is handed to
/// [`report_uncaught`]; panics raised with a [`RawFailure`] or
/// [`io::Error`](std::io::Error) payload keep their attributes.
/// Panics raised while a report is being delivered are logged and dropped.
///
/// # Errors
///
/// Returns [`HookError::NoRuntime`] outside a runtime and
/// [`HookError::AlreadyInstalled`] on every call after the first.
pub fn install(handler: Arc<FailureHandler>) -> Result<(), HookError> {
    let runtime = Handle::try_current().map_err(|_| HookError::NoRuntime)?;

    if INSTALLED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(HookError::AlreadyInstalled);
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);

        if in_reporting_pipeline() {
            error!(panic = %info, "panic inside the reporting pipeline, not reported");
            return;
        }

        drop(report_uncaught(&runtime, &handler, RawFailure::from_panic(info)));
    }));

    info!("failure hooks installed");
    Ok(())
}

/// Report an uncaught failure on `runtime`.
///
/// The filesystem monitor pass runs as its own task so a slow sink on the
/// monitor report never delays the uncaught report or the restart decision.
/// The returned handle resolves to the uncaught report's outcome.
pub fn report_uncaught(
    runtime: &Handle,
    handler: &Arc<FailureHandler>,
    failure: RawFailure,
) -> JoinHandle<Handled> {
    let failure = Arc::new(failure);

    let monitor = Arc::clone(handler);
    let observed = Arc::clone(&failure);
    runtime.spawn(async move {
        monitor.on_uncaught_exception_observed(&observed).await;
    });

    let handler = Arc::clone(handler);
    runtime.spawn(async move { handler.on_uncaught_exception(&failure).await })
}

/// Whether [`install`] has succeeded in this process.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Spawn `future` and report an `Err` result as an unhandled rejection.
///
/// `context` names the task in the report. Errors that are (or wrap) a
/// [`RawFailure`] or an [`io::Error`](std::io::Error) keep their attributes,
/// so they classify by name or code like any other failure.
pub fn spawn_supervised<F, E>(
    handler: Arc<FailureHandler>,
    context: impl Into<String>,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    let context = context.into();
    tokio::spawn(async move {
        if let Err(e) = future.await {
            let reason = RawFailure::from_anyhow(&e.into());
            handler.on_unhandled_rejection(&reason, &context).await;
        }
    })
}
