//! Append-only failure log.
//!
//! One line per report: `ERROR: <YYYY-MM-DD HH:MM:SS> - <stack-or-message>`.
//! The file is created if absent and never rotated or truncated here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::io::AsyncWriteExt;

use super::Sink;
use crate::error::SinkError;
use crate::report::Report;

/// Appends one line per report to a local file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Format the log line for `report`, including the trailing newline.
pub fn format_line(report: &Report) -> String {
    let timestamp = report
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    let body = report.stack_or_message().unwrap_or("<no message>");
    format!("ERROR: {timestamp} - {body}\n")
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn deliver(&self, report: &Report) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format_line(report).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
