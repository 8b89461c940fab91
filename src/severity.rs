//! Severity levels and the kind-to-severity mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::FailureKind;
use crate::failure::RawFailure;

/// Urgency of a failure. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action needed.
    Low,
    /// May need attention soon.
    Medium,
    /// Needs attention now.
    High,
    /// Process is down or at risk.
    Critical,
}

impl Severity {
    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// RGB color used by rich notification embeds.
    pub fn color(self) -> u32 {
        match self {
            Self::Low => 0x00_FF_00,
            Self::Medium => 0xFF_A5_00,
            Self::High => 0xFF_00_00,
            Self::Critical => 0xFF_00_FF,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote status at or above which a protocol error is critical.
const SERVER_ERROR_STATUS: u16 = 500;

/// Resolve the severity for a classified failure.
///
/// Only [`FailureKind::ProtocolError`] consults the failure itself: a 5xx
/// remote status is critical, anything else (including no status) is high.
pub fn severity(kind: FailureKind, failure: &RawFailure) -> Severity {
    match kind {
        FailureKind::ProtocolError => {
            let status = failure.status.or(failure.http_status);
            if status.is_some_and(|s| s >= SERVER_ERROR_STATUS) {
                Severity::Critical
            } else {
                Severity::High
            }
        }
        FailureKind::RateLimit => Severity::Medium,
        FailureKind::Network => Severity::High,
        FailureKind::Database => Severity::Critical,
        FailureKind::Permission => Severity::Medium,
        FailureKind::Validation => Severity::Low,
        FailureKind::Runtime => Severity::High,
        FailureKind::Filesystem => Severity::High,
        FailureKind::OperatingSystem => Severity::Critical,
        FailureKind::Security => Severity::Critical,
        FailureKind::Configuration => Severity::High,
        FailureKind::ThirdParty => Severity::Medium,
        FailureKind::DuplicateReplyError => Severity::Medium,
        FailureKind::Unknown => Severity::Medium,
    }
}
