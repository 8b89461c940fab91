//! Configuration loading for crashwatch.
//!
//! Loads `crashwatch.toml` with per-section defaults. All sections use
//! `#[serde(default)]` so a minimal or empty config file is valid, and a
//! missing file yields the defaults. Settings are static for the lifetime
//! of the process.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrashwatchConfig {
    /// Identity shown in notifications and console banners.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Remote notification webhook.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Append-only failure log.
    #[serde(default)]
    pub log: LogConfig,

    /// Restart supervision.
    #[serde(default)]
    pub restart: RestartConfig,

    /// Client event intake for `crashwatch start`.
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Structured tracing output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity of the supervised client.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Client tag shown in the footer and restart notice.
    #[serde(default = "default_identity_name")]
    pub name: String,

    /// Avatar image URL sent with webhook messages.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_identity_name(),
            avatar_url: None,
        }
    }
}

/// Remote webhook notifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Webhook endpoint. Notifications are disabled when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Environment variable that overrides `webhook_url` when set.
    #[serde(default = "default_webhook_url_env")]
    pub webhook_url_env: String,

    /// Display name used for webhook messages.
    #[serde(default = "default_username")]
    pub username: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_url_env: default_webhook_url_env(),
            username: default_username(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Append-only failure log settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Path of the failure log file.
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

/// Restart supervision settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
    /// Exit for an external restart after uncaught failures.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between the restart notice and process exit.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Exit code used when terminating for restart.
    #[serde(default = "default_exit_code")]
    pub exit_code: i32,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_secs: default_delay_secs(),
            exit_code: default_exit_code(),
        }
    }
}

/// Client event intake settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Read newline-delimited JSON client events from stdin.
    #[serde(default = "default_true")]
    pub stdin: bool,

    /// Capacity of the channel between the reader and the handler.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            stdin: true,
            channel_buffer: default_channel_buffer(),
        }
    }
}

/// Structured tracing output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for JSON tracing logs. Defaults to `~/.crashwatch/logs`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Level for crashwatch's own events when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_log_level(),
        }
    }
}

impl CrashwatchConfig {
    /// Validate that configuration values are within sane bounds.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(raw) = self.notifier.webhook_url.as_deref() {
            let parsed = url::Url::parse(raw)
                .with_context(|| format!("notifier.webhook_url is not a valid URL: {raw}"))?;
            anyhow::ensure!(
                parsed.scheme() == "https" || parsed.scheme() == "http",
                "notifier.webhook_url must use http or https"
            );
        }
        anyhow::ensure!(
            (1..=120).contains(&self.notifier.timeout_secs),
            "notifier.timeout_secs must be in [1, 120]"
        );
        anyhow::ensure!(
            !self.notifier.username.trim().is_empty(),
            "notifier.username must not be empty"
        );
        anyhow::ensure!(
            !self.log.path.as_os_str().is_empty(),
            "log.path must not be empty"
        );
        anyhow::ensure!(
            self.restart.delay_secs <= 300,
            "restart.delay_secs must be <= 300"
        );
        anyhow::ensure!(
            self.restart.exit_code != 0,
            "restart.exit_code must be non-zero"
        );
        anyhow::ensure!(
            (1..=4096).contains(&self.intake.channel_buffer),
            "intake.channel_buffer must be in [1, 4096]"
        );
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("logging.level is not a valid level: {}", self.logging.level))?;
        Ok(())
    }

    /// Replace `notifier.webhook_url` with the value of the configured
    /// environment variable, when that variable is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(&self.notifier.webhook_url_env) {
            if !url.trim().is_empty() {
                self.notifier.webhook_url = Some(url.trim().to_owned());
            }
        }
    }

    /// Resolved tracing log directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home
    /// directory cannot be determined.
    pub fn logs_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.logging.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("logs")),
        }
    }
}

/// Parse configuration from TOML text, apply environment overrides, and
/// validate.
///
/// # Errors
///
/// Returns an error if the text cannot be parsed or fails validation.
pub fn parse_config(contents: &str) -> anyhow::Result<CrashwatchConfig> {
    let mut config: CrashwatchConfig =
        toml::from_str(contents).context("failed to parse crashwatch config")?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or fails
/// validation.
pub fn load_config(path: &Path) -> anyhow::Result<CrashwatchConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read crashwatch config at {}", path.display()))
        }
    };
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

/// Root directory for crashwatch state (`~/.crashwatch`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".crashwatch"))
}

/// Default config file path (`~/.crashwatch/crashwatch.toml`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("crashwatch.toml"))
}

// Default value functions for serde.

fn default_identity_name() -> String {
    "crashwatch".to_owned()
}

fn default_webhook_url_env() -> String {
    "CRASHWATCH_WEBHOOK_URL".to_owned()
}

fn default_username() -> String {
    "Crashwatch".to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_path() -> PathBuf {
    PathBuf::from("bot_errors.log")
}

fn default_true() -> bool {
    true
}

fn default_channel_buffer() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_delay_secs() -> u64 {
    5
}

fn default_exit_code() -> i32 {
    1
}
