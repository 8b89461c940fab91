//! Crashwatch: failure reporting and restart supervision for long-running
//! chat bot processes.
//!
//! Every failure the process observes (panics, failed background tasks,
//! client and shard error events) is classified into a closed taxonomy,
//! given a severity and remediation hints, rendered as a report, and fanned
//! out to the console, an append-only log, and a webhook. Uncaught failures
//! additionally schedule a one-time exit so an external process manager can
//! restart the bot.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod advisory;
pub mod classify;
pub mod failure;
pub mod host;
pub mod report;
pub mod severity;

pub mod dispatch;
pub mod error;
pub mod sink;
pub mod supervisor;

pub mod events;
pub mod handler;
pub mod hooks;

pub mod config;
pub mod logging;

pub use classify::{classify, FailureKind};
pub use failure::RawFailure;
pub use handler::{FailureHandler, Handled};
pub use report::{FailureSource, Report};
pub use severity::{severity, Severity};
