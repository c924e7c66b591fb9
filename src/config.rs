//! Configuration for the exception notifier
//!
//! `NotifierConfig` holds the webhook target, message options and the
//! formatting knobs. It can be built in code or loaded with `figment` from
//! a TOML file merged with `EXCEPTION_NOTIFIER_` environment variables.
//! Callbacks and the data filter are code-only and never serialized.

use crate::core::{DataMap, ExceptionReport};
use crate::formatting::DEFAULT_COLOR;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Decides whether a data entry is left out of the notification.
pub type IgnoreDataIf = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

/// Runs before delivery and may rewrite the outbound message body.
pub type PreCallback = Arc<dyn Fn(&ExceptionReport, &mut DataMap) + Send + Sync>;

/// Runs after the delivery attempt with the body that was sent.
pub type PostCallback = Arc<dyn Fn(&ExceptionReport, &DataMap) + Send + Sync>;

/// The main configuration struct for the notifier.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct NotifierConfig {
    /// The Slack incoming webhook URL. Required for delivery.
    pub webhook_url: Option<String>,
    /// Extra top-level message parameters. A `color` entry sets the
    /// attachment color instead of being sent as-is.
    #[serde(default)]
    pub additional_parameters: DataMap,
    /// Maximum number of backtrace frames to include.
    pub backtrace_lines: Option<usize>,
    /// Options handed through to the webhook client.
    #[serde(default)]
    pub client: ClientOptions,
    #[serde(skip)]
    pub ignore_data_if: Option<IgnoreDataIf>,
    #[serde(skip)]
    pub pre_callback: Option<PreCallback>,
    #[serde(skip)]
    pub post_callback: Option<PostCallback>,
}

/// Defaults applied to every request the webhook client sends.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientOptions {
    /// Channel override, e.g. `#alerts`.
    pub channel: Option<String>,
    /// Display name override.
    pub username: Option<String>,
    /// Icon override, e.g. `:rotating_light:`.
    pub icon_emoji: Option<String>,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            channel: None,
            username: None,
            icon_emoji: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl NotifierConfig {
    /// Creates a config targeting `webhook_url` with everything else defaulted.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: Some(webhook_url.into()),
            ..Default::default()
        }
    }

    /// Loads the configuration from the specified TOML file.
    ///
    /// Environment variables override file values, e.g.
    /// `EXCEPTION_NOTIFIER_WEBHOOK_URL` or `EXCEPTION_NOTIFIER_CLIENT__CHANNEL`.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config: NotifierConfig = Figment::new()
            .merge(Serialized::defaults(NotifierConfig::default()))
            .merge(Toml::file(config_path.as_ref()))
            .merge(Env::prefixed("EXCEPTION_NOTIFIER_").split("__"))
            .extract()?;
        Ok(config)
    }

    pub fn with_additional_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_parameters.insert(key.into(), value);
        self
    }

    pub fn with_backtrace_lines(mut self, lines: usize) -> Self {
        self.backtrace_lines = Some(lines);
        self
    }

    pub fn with_client_options(mut self, client: ClientOptions) -> Self {
        self.client = client;
        self
    }

    pub fn ignore_data_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.ignore_data_if = Some(Arc::new(predicate));
        self
    }

    pub fn pre_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ExceptionReport, &mut DataMap) + Send + Sync + 'static,
    {
        self.pre_callback = Some(Arc::new(callback));
        self
    }

    pub fn post_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ExceptionReport, &DataMap) + Send + Sync + 'static,
    {
        self.post_callback = Some(Arc::new(callback));
        self
    }

    /// Splits `additional_parameters` into the attachment color and the
    /// remaining message options.
    pub fn message_options(&self) -> (String, DataMap) {
        let mut options = self.additional_parameters.clone();
        let color = match options.remove("color") {
            Some(Value::String(color)) => color,
            Some(Value::Null) | None => DEFAULT_COLOR.to_string(),
            Some(other) => other.to_string(),
        };
        (color, options)
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("webhook_url", &self.webhook_url)
            .field("additional_parameters", &self.additional_parameters)
            .field("backtrace_lines", &self.backtrace_lines)
            .field("client", &self.client)
            .field("ignore_data_if", &self.ignore_data_if.is_some())
            .field("pre_callback", &self.pre_callback.is_some())
            .field("post_callback", &self.post_callback.is_some())
            .finish()
    }
}
