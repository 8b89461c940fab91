//! Client library event intake.
//!
//! The chat client runs elsewhere and forwards its error events over a
//! channel. [`read_client_events`] turns newline-delimited JSON (one
//! [`ClientEvent`] per line, e.g. piped on stdin) into channel messages;
//! [`run_client_events`] drains the channel into the failure handler.
//!
//! ```text
//! {"event":"error","name":"DiscordAPIError","message":"Missing Access","status":403}
//! {"event":"shard_error","shard_id":2,"failure":{"code":"ECONNRESET"}}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::failure::RawFailure;
use crate::handler::FailureHandler;

/// Error events emitted by the chat client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The client reported an error.
    Error(RawFailure),
    /// A shard reported an error.
    ShardError {
        /// The failure.
        failure: RawFailure,
        /// Shard that reported it.
        shard_id: u32,
    },
}

/// Parse one intake line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the line is not a valid [`ClientEvent`].
pub fn parse_event_line(line: &str) -> Result<Option<ClientEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Forward newline-delimited JSON events from `reader` into `events`.
///
/// Malformed lines are logged and skipped. Stops at end of input or when
/// the receiving side has gone away. Returns the number of events forwarded.
///
/// # Errors
///
/// Returns an error if reading from `reader` fails.
pub async fn read_client_events<R>(
    reader: R,
    events: mpsc::Sender<ClientEvent>,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let event = match parse_event_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping malformed client event");
                continue;
            }
        };
        if events.send(event).await.is_err() {
            debug!("client event receiver closed, stopping intake");
            break;
        }
        forwarded = forwarded.saturating_add(1);
    }

    debug!(forwarded, "client event input closed");
    Ok(forwarded)
}

/// Handle client events until every sender is dropped.
///
/// Returns the number of events handled.
pub async fn run_client_events(
    handler: Arc<FailureHandler>,
    mut events: mpsc::Receiver<ClientEvent>,
) -> u64 {
    info!("client event intake started");
    let mut handled: u64 = 0;

    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Error(failure) => {
                handler.on_client_error(&failure).await;
            }
            ClientEvent::ShardError { failure, shard_id } => {
                handler.on_shard_error(&failure, shard_id).await;
            }
        }
        handled = handled.saturating_add(1);
    }

    debug!(handled, "client event channel closed");
    handled
}
