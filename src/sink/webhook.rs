//! Remote webhook notifications.
//!
//! Posts one rich embed per report to a chat webhook. Send-only: the
//! response body is read only to explain a non-success status.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::Sink;
use crate::error::SinkError;
use crate::report::{truncate_chars, Report};

/// Embed description limit, leaving room for the code fence.
const DESCRIPTION_MAX_CHARS: usize = 4000;
/// Embed field value limit.
const FIELD_MAX_CHARS: usize = 1024;
/// Response body kept in [`SinkError::Status`].
const ERROR_BODY_MAX_CHARS: usize = 500;

/// Webhook message payload.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    /// Display name of the sender.
    pub username: String,
    /// Avatar image URL of the sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Rich report objects.
    pub embeds: Vec<Embed>,
}

/// One rich report object.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    /// Title naming the failure kind.
    pub title: String,
    /// Stack trace or message in a code block.
    pub description: String,
    /// Sidebar color derived from severity.
    pub color: u32,
    /// Report sections.
    pub fields: Vec<EmbedField>,
    /// Bot identity.
    pub footer: EmbedFooter,
    /// RFC 3339 report timestamp.
    pub timestamp: String,
}

/// A named embed section.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    /// Section name.
    pub name: String,
    /// Section body.
    pub value: String,
    /// Render side by side with adjacent inline fields.
    pub inline: bool,
}

/// Embed footer.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
}

/// Delivers reports to a webhook endpoint.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    username: String,
    avatar_url: Option<String>,
    identity: String,
}

impl WebhookSink {
    /// Create a webhook sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        avatar_url: Option<String>,
        identity: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            username: username.into(),
            avatar_url,
            identity: identity.into(),
        })
    }

    /// Build the payload that [`Sink::deliver`] would post for `report`.
    pub fn build_message(&self, report: &Report) -> WebhookMessage {
        let body = report.stack_or_message().unwrap_or("<no message>");
        let description = format!("```\n{}\n```", truncate_chars(body, DESCRIPTION_MAX_CHARS));

        let advisories = report
            .advisories
            .iter()
            .map(|hint| format!("\u{279c} {hint}"))
            .collect::<Vec<_>>()
            .join("\n");

        let fields = vec![
            field("Kind", report.kind.as_str(), true),
            field("Severity", report.severity.as_str(), true),
            field(
                "Timestamp",
                &report.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                true,
            ),
            field("Details", &report.details_text(), false),
            field("Advisories", &advisories, false),
            field("Host", &report.host.to_string(), false),
        ];

        WebhookMessage {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            embeds: vec![Embed {
                title: format!("Failure detected: {}", report.kind),
                description,
                color: report.severity.color(),
                fields,
                footer: EmbedFooter {
                    text: format!("Bot: {}", self.identity),
                },
                timestamp: report.timestamp.to_rfc3339(),
            }],
        }
    }
}

#[async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, report: &Report) -> Result<(), SinkError> {
        let message = self.build_message(report);
        let response = self.client.post(&self.url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_MAX_CHARS),
            });
        }

        debug!(report_id = %report.id, "webhook notification sent");
        Ok(())
    }
}

fn field(name: &str, value: &str, inline: bool) -> EmbedField {
    let value = if value.trim().is_empty() { "-" } else { value };
    EmbedField {
        name: name.to_owned(),
        value: truncate_chars(value, FIELD_MAX_CHARS),
        inline,
    }
}
