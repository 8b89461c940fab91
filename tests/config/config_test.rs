//! Tests for configuration parsing, validation, and loading.

use std::path::PathBuf;

use crashwatch::config::{load_config, parse_config, CrashwatchConfig};

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn empty_config_uses_defaults() {
    let config = parse_config("").expect("empty config should be valid");

    assert_eq!(config.identity.name, "crashwatch");
    assert!(config.identity.avatar_url.is_none());
    assert_eq!(config.notifier.username, "Crashwatch");
    assert_eq!(config.notifier.timeout_secs, 10);
    assert_eq!(config.notifier.webhook_url_env, "CRASHWATCH_WEBHOOK_URL");
    assert_eq!(config.log.path, PathBuf::from("bot_errors.log"));
    assert!(config.restart.enabled);
    assert_eq!(config.restart.delay_secs, 5);
    assert_eq!(config.restart.exit_code, 1);
    assert!(config.logging.dir.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.intake.stdin);
    assert_eq!(config.intake.channel_buffer, 64);
}

#[test]
fn full_config_parses() {
    let toml = r#"
[identity]
name = "modbot#4242"
avatar_url = "https://cdn.example.com/modbot.png"

[notifier]
webhook_url = "https://chat.example.com/api/webhooks/1/abc"
webhook_url_env = "CRASHWATCH_TEST_UNUSED_WEBHOOK"
username = "Modbot Alerts"
timeout_secs = 15

[log]
path = "/var/log/modbot/errors.log"

[restart]
enabled = false
delay_secs = 30
exit_code = 75

[intake]
stdin = false
channel_buffer = 16

[logging]
dir = "/var/log/modbot/trace"
level = "debug"
"#;
    let config = parse_config(toml).expect("full config should parse");

    assert_eq!(config.identity.name, "modbot#4242");
    assert_eq!(
        config.notifier.webhook_url.as_deref(),
        Some("https://chat.example.com/api/webhooks/1/abc")
    );
    assert_eq!(config.notifier.username, "Modbot Alerts");
    assert_eq!(config.notifier.timeout_secs, 15);
    assert_eq!(config.log.path, PathBuf::from("/var/log/modbot/errors.log"));
    assert!(!config.restart.enabled);
    assert_eq!(config.restart.delay_secs, 30);
    assert_eq!(config.restart.exit_code, 75);
    assert!(!config.intake.stdin);
    assert_eq!(config.intake.channel_buffer, 16);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.logs_dir().expect("logs dir"),
        PathBuf::from("/var/log/modbot/trace")
    );
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = parse_config("[restart]\ndelay_secs = 12\n").expect("partial config");
    assert_eq!(config.restart.delay_secs, 12);
    assert!(config.restart.enabled);
    assert_eq!(config.restart.exit_code, 1);
}

#[test]
fn malformed_toml_is_rejected() {
    assert!(parse_config("[restart\ndelay_secs = ").is_err());
    assert!(parse_config("[restart]\ndelay_secs = \"soon\"\n").is_err());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn rejects(toml: &str, needle: &str) {
    let err = parse_config(toml).expect_err("config should be rejected");
    let text = format!("{err:#}");
    assert!(text.contains(needle), "unexpected error: {text}");
}

#[test]
fn invalid_webhook_url_is_rejected() {
    rejects(
        "[notifier]\nwebhook_url = \"not a url\"\n",
        "notifier.webhook_url",
    );
}

#[test]
fn non_http_webhook_is_rejected() {
    rejects(
        "[notifier]\nwebhook_url = \"ftp://example.com/hook\"\n",
        "http or https",
    );
}

#[test]
fn zero_exit_code_is_rejected() {
    rejects("[restart]\nexit_code = 0\n", "restart.exit_code");
}

#[test]
fn timeout_bounds_are_enforced() {
    rejects("[notifier]\ntimeout_secs = 0\n", "notifier.timeout_secs");
    rejects("[notifier]\ntimeout_secs = 121\n", "notifier.timeout_secs");
}

#[test]
fn long_restart_delay_is_rejected() {
    rejects("[restart]\ndelay_secs = 301\n", "restart.delay_secs");
}

#[test]
fn zero_channel_buffer_is_rejected() {
    rejects("[intake]\nchannel_buffer = 0\n", "intake.channel_buffer");
}

#[test]
fn unknown_log_level_is_rejected() {
    rejects("[logging]\nlevel = \"loud\"\n", "logging.level");
}

#[test]
fn blank_username_is_rejected() {
    rejects("[notifier]\nusername = \"  \"\n", "notifier.username");
}

#[test]
fn default_struct_is_valid() {
    CrashwatchConfig::default()
        .validate()
        .expect("defaults should validate");
}

// ---------------------------------------------------------------------------
// Environment override
// ---------------------------------------------------------------------------

#[test]
fn env_variable_overrides_webhook_url() {
    let var = "CRASHWATCH_TEST_WEBHOOK_OVERRIDE";
    std::env::set_var(var, "https://override.example.com/hook");

    let toml = format!(
        "[notifier]\nwebhook_url = \"https://file.example.com/hook\"\nwebhook_url_env = \"{var}\"\n"
    );
    let config = parse_config(&toml).expect("config with override");
    std::env::remove_var(var);

    assert_eq!(
        config.notifier.webhook_url.as_deref(),
        Some("https://override.example.com/hook")
    );
}

#[test]
fn unset_env_variable_keeps_file_value() {
    let toml = "[notifier]\nwebhook_url = \"https://file.example.com/hook\"\nwebhook_url_env = \"CRASHWATCH_TEST_NEVER_SET\"\n";
    let config = parse_config(toml).expect("config");
    assert_eq!(
        config.notifier.webhook_url.as_deref(),
        Some("https://file.example.com/hook")
    );
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(config.identity.name, "crashwatch");
}

#[test]
fn file_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("crashwatch.toml");
    std::fs::write(&path, "[identity]\nname = \"filebot\"\n").expect("write config");

    let config = load_config(&path).expect("load");
    assert_eq!(config.identity.name, "filebot");
}

#[test]
fn invalid_file_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("crashwatch.toml");
    std::fs::write(&path, "[restart]\nexit_code = 0\n").expect("write config");

    let err = load_config(&path).expect_err("invalid config");
    assert!(format!("{err:#}").contains("crashwatch.toml"));
}
