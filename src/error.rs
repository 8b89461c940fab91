//! Error types for sinks and hook registration.
//!
//! None of these ever escape the reporting pipeline: sink errors are logged
//! by the dispatcher and dropped.

/// Failure delivering a report to a sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Local I/O failed (file append, console write).
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Request to the remote endpoint failed.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status.
    #[error("webhook returned non-success status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Report could not be encoded for the sink.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure installing the process-wide hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hooks were already installed for this process.
    #[error("failure hooks are already installed")]
    AlreadyInstalled,

    /// Installation was attempted outside a tokio runtime.
    #[error("failure hooks must be installed from within a tokio runtime")]
    NoRuntime,
}
