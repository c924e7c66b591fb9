use serde_json::json;
use serial_test::serial;
use slack_exception_notifier::{NotifierConfig, SlackNotifier};

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::test_utils::create_config_file;

#[test]
#[serial]
fn test_load_full_valid_config() {
    let toml_content = r##"
        webhook_url = "https://hooks.slack.com/services/T000/B000/XXXX"
        backtrace_lines = 5
        [additional_parameters]
        color = "warning"
        icon_url = "https://example.com/bug.png"
        [client]
        channel = "#ops"
        username = "exception-bot"
        timeout_seconds = 3
    "##;
    let (_dir, path) = create_config_file(toml_content);

    let config = NotifierConfig::load(&path).unwrap();

    assert_eq!(
        config.webhook_url.as_deref(),
        Some("https://hooks.slack.com/services/T000/B000/XXXX")
    );
    assert_eq!(config.backtrace_lines, Some(5));
    assert_eq!(config.client.channel.as_deref(), Some("#ops"));
    assert_eq!(config.client.username.as_deref(), Some("exception-bot"));
    assert_eq!(config.client.icon_emoji, None);
    assert_eq!(config.client.timeout_seconds, 3);

    let (color, options) = config.message_options();
    assert_eq!(color, "warning");
    assert_eq!(options.get("icon_url"), Some(&json!("https://example.com/bug.png")));

    assert!(SlackNotifier::try_new(config).is_ok());
}

#[test]
#[serial]
fn test_defaults_apply_for_missing_keys() {
    let (_dir, path) = create_config_file(r#"webhook_url = "https://hooks.example.com/x""#);

    let config = NotifierConfig::load(&path).unwrap();

    assert_eq!(config.backtrace_lines, None);
    assert!(config.additional_parameters.is_empty());
    assert_eq!(config.client.timeout_seconds, 10);
    assert_eq!(config.message_options().0, "danger");
}

#[test]
#[serial]
fn test_missing_webhook_url_yields_inert_notifier() {
    let (_dir, path) = create_config_file("backtrace_lines = 3");

    let config = NotifierConfig::load(&path).unwrap();

    assert!(config.webhook_url.is_none());
    assert!(!SlackNotifier::new(config).is_valid());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let (_dir, path) = create_config_file(
        r##"
        webhook_url = "https://hooks.example.com/from-file"
        [client]
        channel = "#file"
        "##,
    );

    std::env::set_var("EXCEPTION_NOTIFIER_WEBHOOK_URL", "https://hooks.example.com/from-env");
    std::env::set_var("EXCEPTION_NOTIFIER_CLIENT__CHANNEL", "#env");
    let result = NotifierConfig::load(&path);
    std::env::remove_var("EXCEPTION_NOTIFIER_WEBHOOK_URL");
    std::env::remove_var("EXCEPTION_NOTIFIER_CLIENT__CHANNEL");

    let config = result.unwrap();
    assert_eq!(
        config.webhook_url.as_deref(),
        Some("https://hooks.example.com/from-env")
    );
    assert_eq!(config.client.channel.as_deref(), Some("#env"));
}

#[test]
#[serial]
fn test_invalid_type_is_rejected() {
    let (_dir, path) = create_config_file(r#"backtrace_lines = "lots""#);
    assert!(NotifierConfig::load(&path).is_err());
}
