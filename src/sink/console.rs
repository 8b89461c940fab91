//! Console presentation: report blocks on stderr, lifecycle banners on stdout.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::Sink;
use crate::error::SinkError;
use crate::report::Report;

const REPORT_BANNER: &str = "══════════ FAILURE ══════════";
const RESTART_BANNER: &str = "══════════ RESTART ══════════";
const RULE: &str = "═══════════════════════════";

type Writer = Box<dyn Write + Send>;

/// Writes human-readable reports and banners to the terminal.
///
/// Output is informational only and never machine-parsed.
pub struct ConsoleSink {
    out: Mutex<Writer>,
    err: Mutex<Writer>,
}

impl ConsoleSink {
    /// Console bound to the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Console bound to arbitrary writers.
    pub fn with_writers(out: Writer, err: Writer) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Write a report block to the error stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn print_report(&self, report: &Report) -> io::Result<()> {
        write_locked(&self.err, &render_report(report))
    }

    /// Note on the error stream that `sink` could not deliver `report`.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn print_sink_failure(&self, report: &Report, sink: &str, reason: &str) -> io::Result<()> {
        let text = format!(
            "\u{26a0} Sink {sink} failed for report {}: {reason}\n",
            report.id
        );
        write_locked(&self.err, &text)
    }

    /// Announce that protection is active for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn announce_startup(&self, identity: &str) -> io::Result<()> {
        let text = format!(
            "{RULE}\n\u{2705} crashwatch started\nProtection active for {identity}\n{RULE}\n"
        );
        write_locked(&self.out, &text)
    }

    /// Announce an imminent restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn announce_restart(&self, identity: &str, delay: Duration) -> io::Result<()> {
        let text = format!(
            "{RESTART_BANNER}\nRestarting {identity} in {} seconds...\n{RULE}\n",
            delay.as_secs()
        );
        write_locked(&self.out, &text)
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, report: &Report) -> Result<(), SinkError> {
        self.print_report(report)?;
        Ok(())
    }
}

fn write_locked(writer: &Mutex<Writer>, text: &str) -> io::Result<()> {
    // A poisoned lock only means another writer panicked mid-write.
    let mut guard = writer.lock().unwrap_or_else(|e| e.into_inner());
    guard.write_all(text.as_bytes())?;
    guard.flush()
}

/// Render a report as a framed text block.
pub fn render_report(report: &Report) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{REPORT_BANNER}");
    let _ = writeln!(text, "{}", report.headline());
    let _ = writeln!(
        text,
        "Kind: {} | Severity: {} | Timestamp: {}",
        report.kind,
        report.severity,
        report.timestamp.to_rfc3339()
    );
    let _ = writeln!(text, "Report: {}", report.id);
    let _ = writeln!(text, "\nDetails:\n{}", indent(&report.details_text()));

    text.push_str("\nAdvisories:\n");
    for hint in &report.advisories {
        let _ = writeln!(text, "  \u{279c} {hint}");
    }

    let _ = writeln!(text, "\nHost:\n{}", indent(&report.host.to_string()));

    if let Some(stack) = report.stack.as_deref() {
        let _ = writeln!(text, "\nStack:\n{}", indent(stack));
    }
    let _ = writeln!(text, "{RULE}");
    text
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
