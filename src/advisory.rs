//! Static remediation hints per failure kind.

use crate::classify::FailureKind;

/// Catalog entries. Lookups for a missing kind fall back to the
/// [`FailureKind::Unknown`] entry.
const CATALOG: &[(FailureKind, &[&str])] = &[
    (
        FailureKind::ProtocolError,
        &[
            "Check that the bot has the permissions the endpoint requires",
            "Review the client library documentation for this endpoint",
            "Consider retrying the call",
        ],
    ),
    (
        FailureKind::RateLimit,
        &[
            "Queue outgoing requests",
            "Reduce request frequency",
            "Cache frequently requested results",
        ],
    ),
    (
        FailureKind::Network,
        &[
            "Check network connectivity",
            "Retry with exponential backoff",
            "Review firewall configuration",
        ],
    ),
    (
        FailureKind::Database,
        &[
            "Check the database connection",
            "Review the failing queries",
            "Make sure indexes are in place",
        ],
    ),
    (
        FailureKind::Permission,
        &[
            "Check the bot's permissions on the server",
            "Review the role hierarchy",
            "Make sure the required gateway intents are enabled",
        ],
    ),
    (
        FailureKind::Validation,
        &[
            "Validate input data",
            "Add type checks",
            "Handle missing values",
        ],
    ),
    (
        FailureKind::Runtime,
        &[
            "Review the code path that failed",
            "Add logging around the failure",
            "Handle the error closer to its source",
        ],
    ),
    (
        FailureKind::Filesystem,
        &[
            "Check file permissions",
            "Make sure the files exist",
            "Review the configured paths",
        ],
    ),
    (
        FailureKind::OperatingSystem,
        &[
            "Check system resources",
            "Review memory and CPU limits",
            "Make sure the operating system is up to date",
        ],
    ),
    (
        FailureKind::Security,
        &[
            "Review security policies",
            "Make sure credentials are protected",
            "Add further security controls",
        ],
    ),
    (
        FailureKind::Configuration,
        &[
            "Check the environment configuration",
            "Make sure all required environment variables are set",
            "Review the configuration files",
        ],
    ),
    (
        FailureKind::ThirdParty,
        &[
            "Check the third-party service status",
            "Review the service documentation",
            "Handle errors from this service explicitly",
        ],
    ),
    (
        FailureKind::DuplicateReplyError,
        &[
            "Reply to each interaction only once",
            "Review the control flow for duplicate replies",
            "Defer the reply and send follow-ups for long responses",
        ],
    ),
    (
        FailureKind::Unknown,
        &[
            "Add more logging",
            "Review system events",
            "Consider updating dependencies",
        ],
    ),
];

/// Fallback used if the catalog itself were missing the unknown entry.
const LAST_RESORT: &[&str] = &["Inspect the failure report"];

/// Remediation hints for `kind`, in display order. Never empty.
pub fn advisories(kind: FailureKind) -> &'static [&'static str] {
    lookup(kind)
        .or_else(|| lookup(FailureKind::Unknown))
        .unwrap_or(LAST_RESORT)
}

fn lookup(kind: FailureKind) -> Option<&'static [&'static str]> {
    CATALOG
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, hints)| *hints)
}
