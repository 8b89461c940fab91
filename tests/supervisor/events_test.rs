//! Tests for the client event intake loop.

use std::sync::Arc;

use crashwatch::events::{parse_event_line, read_client_events, run_client_events, ClientEvent};
use crashwatch::supervisor::RestartState;
use crashwatch::{FailureKind, FailureSource, RawFailure, Severity};
use tokio::sync::mpsc;

use super::support::{harness, restart_config};

#[tokio::test]
async fn drains_events_until_senders_close() {
    let h = harness(&restart_config(0), Vec::new());
    let handler = Arc::new(h.handler);
    let (tx, rx) = mpsc::channel(8);

    tx.send(ClientEvent::Error(RawFailure::error("gateway closed")))
        .await
        .expect("send");
    tx.send(ClientEvent::ShardError {
        failure: RawFailure::default().with_code("ECONNREFUSED"),
        shard_id: 1,
    })
    .await
    .expect("send");
    drop(tx);

    let handled = run_client_events(Arc::clone(&handler), rx).await;

    assert_eq!(handled, 2);
    let sources: Vec<FailureSource> = h
        .recording
        .snapshot()
        .into_iter()
        .map(|(source, ..)| source)
        .collect();
    assert_eq!(
        sources,
        vec![
            FailureSource::ClientError,
            FailureSource::ShardError { shard_id: 1 }
        ]
    );
    assert_eq!(handler.supervisor().state(), RestartState::Idle);
}

#[tokio::test]
async fn empty_channel_handles_nothing() {
    let h = harness(&restart_config(0), Vec::new());
    let (tx, rx) = mpsc::channel::<ClientEvent>(1);
    drop(tx);

    assert_eq!(run_client_events(Arc::new(h.handler), rx).await, 0);
    assert_eq!(h.recording.count(), 0);
}

// ---------------------------------------------------------------------------
// Line intake
// ---------------------------------------------------------------------------

#[test]
fn parses_client_error_lines() {
    let event = parse_event_line(
        r#"{"event":"error","name":"DiscordAPIError","message":"Missing Access","status":403}"#,
    )
    .expect("valid line")
    .expect("not blank");

    assert_eq!(
        event,
        ClientEvent::Error(
            RawFailure::default()
                .with_name("DiscordAPIError")
                .with_message("Missing Access")
                .with_status(403)
        )
    );
}

#[test]
fn parses_shard_error_lines() {
    let event = parse_event_line(
        r#"{"event":"shard_error","shard_id":2,"failure":{"code":"ECONNRESET"}}"#,
    )
    .expect("valid line")
    .expect("not blank");

    assert_eq!(
        event,
        ClientEvent::ShardError {
            failure: RawFailure::default().with_code("ECONNRESET"),
            shard_id: 2,
        }
    );
}

#[test]
fn blank_and_malformed_lines() {
    assert!(parse_event_line("   ").expect("blank is fine").is_none());
    assert!(parse_event_line("{not json").is_err());
    assert!(parse_event_line(r#"{"event":"reboot"}"#).is_err());
}

#[tokio::test]
async fn reader_forwards_valid_lines_and_skips_the_rest() {
    let input = concat!(
        r#"{"event":"error","message":"gateway closed"}"#,
        "\n",
        "\n",
        "garbage\n",
        r#"{"event":"shard_error","shard_id":4,"failure":{"name":"DiscordAPIError","status":503}}"#,
        "\n",
    );
    let (tx, mut rx) = mpsc::channel(8);

    let forwarded = read_client_events(input.as_bytes(), tx)
        .await
        .expect("reading from memory");

    assert_eq!(forwarded, 2);
    assert!(matches!(rx.recv().await, Some(ClientEvent::Error(_))));
    assert!(matches!(
        rx.recv().await,
        Some(ClientEvent::ShardError { shard_id: 4, .. })
    ));
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn reader_feeds_the_handler_end_to_end() {
    let h = harness(&restart_config(0), Vec::new());
    let handler = Arc::new(h.handler);
    let (tx, rx) = mpsc::channel(4);

    let input = concat!(
        r#"{"event":"shard_error","shard_id":4,"failure":{"name":"DiscordAPIError","status":503}}"#,
        "\n",
    );
    let intake = tokio::spawn(run_client_events(Arc::clone(&handler), rx));
    read_client_events(input.as_bytes(), tx)
        .await
        .expect("reading from memory");

    assert_eq!(intake.await.expect("intake task"), 1);
    let recorded = h.recording.snapshot();
    assert_eq!(recorded[0].0, FailureSource::ShardError { shard_id: 4 });
    assert_eq!(recorded[0].1, FailureKind::ProtocolError);
    assert_eq!(recorded[0].2, Severity::Critical);
}
