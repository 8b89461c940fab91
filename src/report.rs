//! Structured failure reports.
//!
//! A [`Report`] is built once per observed failure, handed to the sinks, and
//! dropped. Building never fails and performs no I/O: the host snapshot is
//! captured by the caller and passed in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advisory::advisories;
use crate::classify::{classify, FailureKind};
use crate::failure::RawFailure;
use crate::host::HostSnapshot;
use crate::severity::{severity, Severity};

/// Rendered when a failure carries none of the optional detail attributes.
pub const NO_DETAILS: &str = "no additional details available";

/// Maximum characters of request payload kept in the details section.
const REQUEST_PREVIEW_CHARS: usize = 256;

/// Where a failure was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureSource {
    /// A panic that reached the process-wide hook.
    UncaughtException,
    /// A supervised task that resolved to an error.
    UnhandledRejection {
        /// Identifies the task that failed.
        context: String,
    },
    /// An error event from the chat client.
    ClientError,
    /// An error event from one of the client's shards.
    ShardError {
        /// Shard that reported the error.
        shard_id: u32,
    },
    /// Second-pass report of a filesystem failure seen by the panic monitor.
    FilesystemMonitor,
}

impl FailureSource {
    /// Whether failures from this source trigger the restart supervisor.
    pub fn restarts_process(&self) -> bool {
        matches!(self, Self::UncaughtException | Self::UnhandledRejection { .. })
    }
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UncaughtException => f.write_str("Uncaught exception"),
            Self::UnhandledRejection { context } => {
                write!(f, "Unhandled rejection in {context}")
            }
            Self::ClientError => f.write_str("Client error"),
            Self::ShardError { shard_id } => write!(f, "Shard {shard_id} error"),
            Self::FilesystemMonitor => f.write_str("Filesystem error"),
        }
    }
}

/// One labelled contextual detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetail {
    /// Display label (e.g. `"Code"`).
    pub label: String,
    /// Attribute value.
    pub value: String,
}

/// An immutable failure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique report identifier.
    pub id: Uuid,
    /// Where the failure was observed.
    pub source: FailureSource,
    /// Taxonomy kind.
    pub kind: FailureKind,
    /// Resolved severity.
    pub severity: Severity,
    /// When the report was built.
    pub timestamp: DateTime<Utc>,
    /// Optional contextual details, in fixed label order.
    pub details: Vec<ReportDetail>,
    /// Remediation hints for the kind.
    pub advisories: Vec<String>,
    /// Host state at report time.
    pub host: HostSnapshot,
    /// Failure message, if any.
    pub message: Option<String>,
    /// Stack trace, if any.
    pub stack: Option<String>,
}

impl Report {
    /// Details rendered one per line, or [`NO_DETAILS`] when there are none.
    pub fn details_text(&self) -> String {
        if self.details.is_empty() {
            return NO_DETAILS.to_owned();
        }
        self.details
            .iter()
            .map(|d| format!("{}: {}", d.label, d.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Stack trace if present, otherwise the message.
    pub fn stack_or_message(&self) -> Option<&str> {
        self.stack.as_deref().or(self.message.as_deref())
    }

    /// One-line headline, e.g. `"Shard 3 error: gateway closed"`.
    pub fn headline(&self) -> String {
        let message = self.message.as_deref().unwrap_or("<no message>");
        format!("{}: {message}", self.source)
    }
}

/// Build a report for `failure` observed at `source`.
pub fn build(source: FailureSource, failure: &RawFailure, host: HostSnapshot) -> Report {
    let kind = classify(failure);
    let severity = severity(kind, failure);

    Report {
        id: Uuid::new_v4(),
        source,
        kind,
        severity,
        timestamp: Utc::now(),
        details: extract_details(failure),
        advisories: advisories(kind).iter().map(|&a| a.to_owned()).collect(),
        host,
        message: failure.message.clone(),
        stack: failure.stack.clone(),
    }
}

/// Collect the optional contextual attributes present on `failure`.
pub fn extract_details(failure: &RawFailure) -> Vec<ReportDetail> {
    let mut details = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            details.push(ReportDetail {
                label: label.to_owned(),
                value,
            });
        }
    };

    push("Code", failure.code.clone());
    push("Method", failure.method.clone());
    push("Path", failure.path.clone());
    push("HTTP status", failure.http_status.map(|s| s.to_string()));
    push(
        "Request data",
        failure.request_data.as_ref().map(preview_request),
    );
    push("File", failure.file_name.clone());
    push("Line", failure.line_number.map(|l| l.to_string()));

    details
}

/// Compact JSON preview of a request payload, truncated.
fn preview_request(data: &serde_json::Value) -> String {
    let rendered = data.to_string();
    truncate_chars(&rendered, REQUEST_PREVIEW_CHARS)
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}
