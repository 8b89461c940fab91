//! Failure taxonomy and the rule-ordered classifier.
//!
//! Rules are evaluated top to bottom and the first match wins. Attribute sets
//! overlap (a generic error can also carry a `code`), so the order in
//! [`RULES`] is part of the contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::failure::{codes, names, RawFailure};

/// Closed taxonomy of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Remote protocol rejected the call.
    ProtocolError,
    /// Client hit a rate limit.
    RateLimit,
    /// Connection reset or refused.
    Network,
    /// Database driver failure.
    Database,
    /// Missing permission.
    Permission,
    /// Invalid input or type mismatch.
    Validation,
    /// Generic runtime error.
    Runtime,
    /// Missing file or access denied.
    Filesystem,
    /// Operating system failure.
    OperatingSystem,
    /// Security policy violation.
    Security,
    /// Bad configuration.
    Configuration,
    /// Third-party integration failure.
    ThirdParty,
    /// Interaction was replied to more than once.
    DuplicateReplyError,
    /// Nothing else matched.
    Unknown,
}

impl FailureKind {
    /// Every kind, in declaration order.
    pub const ALL: [FailureKind; 14] = [
        Self::ProtocolError,
        Self::RateLimit,
        Self::Network,
        Self::Database,
        Self::Permission,
        Self::Validation,
        Self::Runtime,
        Self::Filesystem,
        Self::OperatingSystem,
        Self::Security,
        Self::Configuration,
        Self::ThirdParty,
        Self::DuplicateReplyError,
        Self::Unknown,
    ];

    /// Display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProtocolError => "ProtocolError",
            Self::RateLimit => "RateLimit",
            Self::Network => "Network",
            Self::Database => "Database",
            Self::Permission => "Permission",
            Self::Validation => "Validation",
            Self::Runtime => "Runtime",
            Self::Filesystem => "Filesystem",
            Self::OperatingSystem => "OperatingSystem",
            Self::Security => "Security",
            Self::Configuration => "Configuration",
            Self::ThirdParty => "ThirdParty",
            Self::DuplicateReplyError => "DuplicateReplyError",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classification rule.
type Rule = (FailureKind, fn(&RawFailure) -> bool);

/// Classification rules in priority order.
const RULES: &[Rule] = &[
    (FailureKind::DuplicateReplyError, is_duplicate_reply),
    (FailureKind::ProtocolError, is_protocol_error),
    (FailureKind::RateLimit, is_rate_limit),
    (FailureKind::Network, is_network),
    (FailureKind::Database, is_database),
    (FailureKind::Permission, is_permission),
    (FailureKind::Validation, is_validation),
    // Any error object. Must stay after the named rules and before the
    // code-only rules below.
    (FailureKind::Runtime, is_generic_error),
    (FailureKind::Filesystem, is_filesystem_code),
    (FailureKind::OperatingSystem, is_system),
    (FailureKind::Security, is_security),
    (FailureKind::Configuration, is_configuration),
    (FailureKind::ThirdParty, is_third_party),
];

fn is_duplicate_reply(f: &RawFailure) -> bool {
    f.has_name(names::ALREADY_REPLIED)
}

fn is_protocol_error(f: &RawFailure) -> bool {
    f.has_name(names::API_ERROR)
}

fn is_rate_limit(f: &RawFailure) -> bool {
    f.has_name(names::RATE_LIMIT)
}

fn is_network(f: &RawFailure) -> bool {
    f.has_code_in(&[codes::CONNECTION_RESET, codes::CONNECTION_REFUSED])
}

fn is_database(f: &RawFailure) -> bool {
    names::DATABASE.iter().any(|name| f.has_name(name))
}

fn is_permission(f: &RawFailure) -> bool {
    f.has_name(names::PERMISSION)
        || f.message
            .as_deref()
            .is_some_and(|m| m.contains("permission"))
}

fn is_validation(f: &RawFailure) -> bool {
    f.has_name(names::VALIDATION) || f.has_name(names::TYPE_ERROR)
}

/// An error object carries both a message and a stack.
fn is_generic_error(f: &RawFailure) -> bool {
    f.message.is_some() && f.stack.is_some()
}

fn is_system(f: &RawFailure) -> bool {
    f.has_name(names::SYSTEM)
}

fn is_security(f: &RawFailure) -> bool {
    f.has_name(names::SECURITY)
}

fn is_configuration(f: &RawFailure) -> bool {
    f.has_name(names::CONFIGURATION)
}

fn is_third_party(f: &RawFailure) -> bool {
    f.has_name(names::THIRD_PARTY)
}

/// Classify a failure. Total: falls back to [`FailureKind::Unknown`].
pub fn classify(failure: &RawFailure) -> FailureKind {
    RULES
        .iter()
        .find(|(_, matches)| matches(failure))
        .map_or(FailureKind::Unknown, |(kind, _)| *kind)
}

/// Whether the failure carries a filesystem code (`ENOENT` or `EACCES`).
///
/// Used by the uncaught-exception monitor, which reports these a second time
/// as filesystem failures.
pub fn is_filesystem_code(failure: &RawFailure) -> bool {
    failure.has_code_in(&[codes::NOT_FOUND, codes::ACCESS_DENIED])
}
