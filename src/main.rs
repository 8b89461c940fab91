//! Crashwatch CLI entry point.
//!
//! Provides `start`, `check`, and `fire` subcommands for running the
//! failure watcher, validating configuration, or sending one synthetic
//! report through every sink.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;

use crashwatch::config::{default_config_path, load_config, CrashwatchConfig};
use crashwatch::{events, hooks, logging, FailureHandler, FailureSource, RawFailure};

/// Crashwatch: failure reporting and restart supervision for bot processes.
#[derive(Parser)]
#[command(name = "crashwatch", version, about)]
struct Cli {
    /// Path to crashwatch.toml (default: ~/.crashwatch/crashwatch.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Install the failure hooks, read client events from stdin, and run
    /// until interrupted.
    Start,
    /// Validate configuration and print the resolved settings.
    Check,
    /// Build one synthetic report and deliver it to every sink.
    Fire {
        /// Failure name (e.g. DiscordAPIError).
        #[arg(long)]
        name: Option<String>,
        /// Failure message.
        #[arg(long, default_value = "synthetic failure from crashwatch fire")]
        message: String,
        /// Failure code (e.g. ENOENT).
        #[arg(long)]
        code: Option<String>,
        /// Remote status (e.g. 502).
        #[arg(long)]
        status: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    match cli.command {
        Command::Start => handle_start(&config).await,
        Command::Check => handle_check(&config, &config_path),
        Command::Fire {
            name,
            message,
            code,
            status,
        } => handle_fire(&config, name, message, code, status).await,
    }
}

/// Install hooks, start the client event intake, and block until Ctrl-C.
async fn handle_start(config: &CrashwatchConfig) -> anyhow::Result<()> {
    let logs_dir = config.logs_dir()?;
    let _logging_guard = logging::init_production(&logs_dir, &config.logging)?;

    let handler = Arc::new(
        FailureHandler::from_config(config).context("failed to build failure handler")?,
    );
    hooks::install(Arc::clone(&handler)).context("failed to install failure hooks")?;

    let (event_tx, event_rx) = mpsc::channel(config.intake.channel_buffer);
    let intake = tokio::spawn(events::run_client_events(Arc::clone(&handler), event_rx));

    if config.intake.stdin {
        let reader = BufReader::new(tokio::io::stdin());
        hooks::spawn_supervised(Arc::clone(&handler), "stdin intake", async move {
            events::read_client_events(reader, event_tx).await.map(|_| ())
        });
    } else {
        drop(event_tx);
    }

    if let Err(e) = handler
        .dispatcher()
        .console()
        .announce_startup(&config.identity.name)
    {
        tracing::warn!(error = %e, "failed to print startup banner");
    }

    info!(
        identity = %config.identity.name,
        log = %config.log.path.display(),
        webhook = config.notifier.webhook_url.is_some(),
        stdin_intake = config.intake.stdin,
        sinks = ?handler.dispatcher().sink_names(),
        "crashwatch started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    intake.abort();
    info!("crashwatch shutting down");
    Ok(())
}

/// Print the resolved configuration.
fn handle_check(config: &CrashwatchConfig, path: &std::path::Path) -> anyhow::Result<()> {
    logging::init_cli(&config.logging);

    let webhook = match config.notifier.webhook_url.as_deref() {
        Some(raw) => url::Url::parse(raw)
            .map(|u| format!("{}://{}/…", u.scheme(), u.host_str().unwrap_or("?")))
            .unwrap_or_else(|_| "invalid".to_owned()),
        None => "disabled".to_owned(),
    };

    println!("config:         {}", path.display());
    println!("identity:       {}", config.identity.name);
    println!("failure log:    {}", config.log.path.display());
    println!("webhook:        {webhook}");
    println!(
        "restart:        {} (delay {}s, exit code {})",
        if config.restart.enabled { "enabled" } else { "disabled" },
        config.restart.delay_secs,
        config.restart.exit_code
    );
    println!(
        "stdin intake:   {} (buffer {})",
        if config.intake.stdin { "enabled" } else { "disabled" },
        config.intake.channel_buffer
    );
    println!(
        "tracing logs:   {} (level {})",
        config.logs_dir()?.display(),
        config.logging.level
    );
    Ok(())
}

/// Deliver one synthetic client-error report. Never restarts.
async fn handle_fire(
    config: &CrashwatchConfig,
    name: Option<String>,
    message: String,
    code: Option<String>,
    status: Option<u16>,
) -> anyhow::Result<()> {
    logging::init_cli(&config.logging);

    let handler = FailureHandler::from_config(config).context("failed to build failure handler")?;

    let mut failure = RawFailure::default().with_message(message);
    failure.name = name;
    failure.code = code;
    failure.status = status;

    let report = Arc::new(handler.build_report(FailureSource::ClientError, &failure));
    info!(kind = %report.kind, severity = %report.severity, "synthetic report built");

    let outcome = handler.dispatcher().dispatch(report).await;
    anyhow::ensure!(
        outcome.all_delivered(),
        "delivery failed for sinks: {}",
        outcome.failed.join(", ")
    );
    info!(delivered = ?outcome.delivered, "synthetic report delivered");
    Ok(())
}
