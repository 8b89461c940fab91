//! Tests for `src/severity.rs`.

use crashwatch::classify::FailureKind;
use crashwatch::{severity, RawFailure, Severity};

fn api_error() -> RawFailure {
    RawFailure::default().with_name("DiscordAPIError")
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[test]
fn protocol_error_with_server_status_is_critical() {
    for status in [500, 502, 503, 599] {
        let failure = api_error().with_status(status);
        assert_eq!(
            severity(FailureKind::ProtocolError, &failure),
            Severity::Critical,
            "status {status}"
        );
    }
}

#[test]
fn protocol_error_with_client_status_is_high() {
    for status in [400, 403, 404, 499] {
        let failure = api_error().with_status(status);
        assert_eq!(
            severity(FailureKind::ProtocolError, &failure),
            Severity::High,
            "status {status}"
        );
    }
}

#[test]
fn protocol_error_without_status_is_high() {
    assert_eq!(
        severity(FailureKind::ProtocolError, &api_error()),
        Severity::High
    );
}

#[test]
fn protocol_error_falls_back_to_http_status() {
    let failure = api_error().with_http_status(503);
    assert_eq!(
        severity(FailureKind::ProtocolError, &failure),
        Severity::Critical
    );
}

#[test]
fn status_takes_precedence_over_http_status() {
    let failure = api_error().with_status(404).with_http_status(503);
    assert_eq!(
        severity(FailureKind::ProtocolError, &failure),
        Severity::High
    );
}

// ---------------------------------------------------------------------------
// Fixed mapping
// ---------------------------------------------------------------------------

#[test]
fn fixed_mapping_for_every_other_kind() {
    let cases = [
        (FailureKind::RateLimit, Severity::Medium),
        (FailureKind::Network, Severity::High),
        (FailureKind::Database, Severity::Critical),
        (FailureKind::Permission, Severity::Medium),
        (FailureKind::Validation, Severity::Low),
        (FailureKind::Runtime, Severity::High),
        (FailureKind::Filesystem, Severity::High),
        (FailureKind::OperatingSystem, Severity::Critical),
        (FailureKind::Security, Severity::Critical),
        (FailureKind::Configuration, Severity::High),
        (FailureKind::ThirdParty, Severity::Medium),
        (FailureKind::DuplicateReplyError, Severity::Medium),
        (FailureKind::Unknown, Severity::Medium),
    ];

    for (kind, expected) in cases {
        assert_eq!(severity(kind, &RawFailure::default()), expected, "{kind}");
    }
}

#[test]
fn status_is_ignored_outside_protocol_errors() {
    let failure = RawFailure::default().with_status(503);
    assert_eq!(severity(FailureKind::RateLimit, &failure), Severity::Medium);
}

#[test]
fn severity_is_deterministic() {
    let failure = api_error().with_status(502);
    for kind in FailureKind::ALL {
        assert_eq!(severity(kind, &failure), severity(kind, &failure.clone()));
    }
}

// ---------------------------------------------------------------------------
// Ordering and labels
// ---------------------------------------------------------------------------

#[test]
fn severities_are_totally_ordered() {
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::Medium < Severity::High);
    assert!(Severity::High < Severity::Critical);

    let worst = [Severity::Medium, Severity::Critical, Severity::Low]
        .into_iter()
        .max();
    assert_eq!(worst, Some(Severity::Critical));
}

#[test]
fn severity_serializes_lowercase() {
    let json = serde_json::to_string(&Severity::Critical).expect("serialize");
    assert_eq!(json, "\"critical\"");
    assert_eq!(Severity::Medium.to_string(), "medium");
}

#[test]
fn severity_colors_are_distinct() {
    let mut colors: Vec<u32> = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ]
    .iter()
    .map(|s| s.color())
    .collect();
    colors.sort_unstable();
    colors.dedup();
    assert_eq!(colors.len(), 4);
    assert_eq!(Severity::Critical.color(), 0xFF00FF);
}
