//! Raw failure values as observed by the host process.
//!
//! A [`RawFailure`] is a bag of optional attributes. The host runtime, the
//! chat client library, and filesystem calls each fill in whatever they
//! know; the classifier only ever looks at attribute presence and values.

use std::backtrace::Backtrace;
use std::fmt::{self, Write as _};
use std::io;
use std::panic::PanicHookInfo;

use serde::{Deserialize, Serialize};

/// Well-known failure names produced by the host runtime and client library.
pub mod names {
    /// Interaction was already acknowledged or replied to.
    pub const ALREADY_REPLIED: &str = "InteractionAlreadyRepliedError";
    /// Remote chat API rejected the call.
    pub const API_ERROR: &str = "DiscordAPIError";
    /// Client library hit a rate limit bucket.
    pub const RATE_LIMIT: &str = "RateLimitError";
    /// Database driver failures.
    pub const DATABASE: &[&str] = &["SequelizeError", "MongoError"];
    /// Missing permission.
    pub const PERMISSION: &str = "PermissionError";
    /// Input validation failure.
    pub const VALIDATION: &str = "ValidationError";
    /// Value of the wrong type.
    pub const TYPE_ERROR: &str = "TypeError";
    /// Operating system level failure.
    pub const SYSTEM: &str = "SystemError";
    /// Security policy violation.
    pub const SECURITY: &str = "SecurityError";
    /// Bad or missing configuration.
    pub const CONFIGURATION: &str = "ConfigurationError";
    /// Failure inside a third-party integration.
    pub const THIRD_PARTY: &str = "ThirdPartyError";
}

/// Conventional error codes carried in [`RawFailure::code`].
pub mod codes {
    /// Connection reset by peer.
    pub const CONNECTION_RESET: &str = "ECONNRESET";
    /// Connection refused.
    pub const CONNECTION_REFUSED: &str = "ECONNREFUSED";
    /// No such file or directory.
    pub const NOT_FOUND: &str = "ENOENT";
    /// Access denied.
    pub const ACCESS_DENIED: &str = "EACCES";
}

/// A failure value with optional attributes.
///
/// Immutable once handed to the pipeline; every stage takes it by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFailure {
    /// Error class name (e.g. `"RateLimitError"`).
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Machine-readable code (e.g. `"ENOENT"`).
    #[serde(default)]
    pub code: Option<String>,
    /// Remote status reported by the client library.
    #[serde(default)]
    pub status: Option<u16>,
    /// HTTP status of the failed request.
    #[serde(default)]
    pub http_status: Option<u16>,
    /// HTTP method of the failed request.
    #[serde(default)]
    pub method: Option<String>,
    /// Request path of the failed request.
    #[serde(default)]
    pub path: Option<String>,
    /// Source file the failure was raised in.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Source line the failure was raised at.
    #[serde(default)]
    pub line_number: Option<u32>,
    /// Request payload that accompanied the failed call.
    #[serde(default)]
    pub request_data: Option<serde_json::Value>,
    /// Captured stack trace or cause chain.
    #[serde(default)]
    pub stack: Option<String>,
}

impl RawFailure {
    /// A generic error object: a message plus a captured stack.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            stack: Some(Backtrace::force_capture().to_string()),
            ..Self::default()
        }
    }

    /// Convert any Rust error, rendering its source chain as the stack.
    ///
    /// A [`RawFailure`] used as an error is passed through unchanged and an
    /// [`io::Error`] goes through [`RawFailure::from_io_error`].
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(failure) = err.downcast_ref::<RawFailure>() {
            return failure.clone();
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Self::from_io_error(io_err);
        }

        let message = err.to_string();
        let mut stack = message.clone();
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(stack, "\n    caused by: {cause}");
            source = cause.source();
        }
        Self {
            message: Some(message),
            stack: Some(stack),
            ..Self::default()
        }
    }

    /// Convert an [`anyhow::Error`], looking through context layers for a
    /// typed failure before falling back to the rendered chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(failure) = err.downcast_ref::<RawFailure>() {
            return failure.clone();
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Self::from_io_error(io_err).with_message(err.to_string());
        }
        Self::from_error(err.as_ref())
    }

    /// Convert an I/O error, keeping only its message and conventional code.
    ///
    /// No stack is attached, so the failure reaches the code-based rules.
    pub fn from_io_error(err: &io::Error) -> Self {
        Self {
            message: Some(err.to_string()),
            code: io_error_code(err.kind()).map(str::to_owned),
            ..Self::default()
        }
    }

    /// Build a failure from a panic observed by the process-wide hook.
    ///
    /// Typed payloads raised with [`std::panic::panic_any`] keep their
    /// attributes: a [`RawFailure`] is used as is (plus the panic location
    /// when it has none) and an [`io::Error`] keeps its code. String payloads
    /// become a message with a captured stack.
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();

        let mut failure = if let Some(failure) = payload.downcast_ref::<RawFailure>() {
            failure.clone()
        } else if let Some(io_err) = payload.downcast_ref::<io::Error>() {
            Self::from_io_error(io_err)
        } else {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "panic with non-string payload".to_owned()
            };
            Self {
                message: Some(message),
                stack: Some(Backtrace::force_capture().to_string()),
                ..Self::default()
            }
        };

        if failure.file_name.is_none() {
            if let Some(location) = info.location() {
                failure.file_name = Some(location.file().to_owned());
                failure.line_number = Some(location.line());
            }
        }
        failure
    }

    /// Set the error class name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the remote status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the HTTP status.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Set the request method and path.
    pub fn with_request(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.path = Some(path.into());
        self
    }

    /// Set the request payload.
    pub fn with_request_data(mut self, data: serde_json::Value) -> Self {
        self.request_data = Some(data);
        self
    }

    /// Set the source location.
    pub fn with_location(mut self, file_name: impl Into<String>, line_number: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line_number);
        self
    }

    /// Set the stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Whether the name equals `expected`.
    pub fn has_name(&self, expected: &str) -> bool {
        self.name.as_deref() == Some(expected)
    }

    /// Whether the code is one of `expected`.
    pub fn has_code_in(&self, expected: &[&str]) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| expected.contains(&code))
    }

    /// Stack trace if present, otherwise the message.
    pub fn stack_or_message(&self) -> Option<&str> {
        self.stack.as_deref().or(self.message.as_deref())
    }

    /// Short one-line description for console headlines.
    pub fn summary(&self) -> &str {
        self.message
            .as_deref()
            .or(self.name.as_deref())
            .or(self.code.as_deref())
            .unwrap_or("<no message>")
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.as_deref(), self.message.as_deref()) {
            (Some(name), Some(message)) => write!(f, "{name}: {message}"),
            _ => f.write_str(self.summary()),
        }
    }
}

impl std::error::Error for RawFailure {}

/// Map an [`io::ErrorKind`] to its conventional code.
fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::NotFound => Some(codes::NOT_FOUND),
        io::ErrorKind::PermissionDenied => Some(codes::ACCESS_DENIED),
        io::ErrorKind::ConnectionReset => Some(codes::CONNECTION_RESET),
        io::ErrorKind::ConnectionRefused => Some(codes::CONNECTION_REFUSED),
        _ => None,
    }
}
