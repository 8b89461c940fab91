//! Report destinations.
//!
//! Each sink delivers one report at a time. Sink errors are returned to the
//! [`Dispatcher`](crate::dispatch::Dispatcher), which logs them and moves on.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::report::Report;

pub mod console;
pub mod file;
pub mod webhook;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use webhook::WebhookSink;

/// A destination that records or forwards reports.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// Deliver one report.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the report could not be delivered.
    async fn deliver(&self, report: &Report) -> Result<(), SinkError>;
}
