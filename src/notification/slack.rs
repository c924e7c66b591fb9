//! A client for posting messages to a Slack incoming webhook.

use crate::config::{ClientOptions, NotifierConfig};
use crate::core::DataMap;
use crate::notification::NotifierError;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// A trait for clients that can deliver a message body to a webhook.
#[async_trait]
pub trait WebhookClientTrait: Send + Sync {
    /// Sends `text` along with the extra message `options`.
    async fn ping(&self, text: &str, options: &DataMap) -> anyhow::Result<()>;
}

/// A client for sending messages to a Slack webhook.
#[derive(Debug, Clone)]
pub struct SlackWebhookClient {
    webhook_url: Url,
    defaults: DataMap,
    http: reqwest::Client,
}

impl SlackWebhookClient {
    /// Creates a new `SlackWebhookClient`, validating the URL up front.
    pub fn new(webhook_url: &str, options: &ClientOptions) -> Result<Self, NotifierError> {
        let url = Url::parse(webhook_url).map_err(|e| NotifierError::InvalidWebhookUrl {
            url: webhook_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifierError::InvalidWebhookUrl {
                url: webhook_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        let mut defaults = DataMap::new();
        let overrides = [
            ("channel", &options.channel),
            ("username", &options.username),
            ("icon_emoji", &options.icon_emoji),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                defaults.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        Ok(Self {
            webhook_url: url,
            defaults,
            http,
        })
    }

    /// Creates a client from the notifier configuration.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, NotifierError> {
        let webhook_url = config
            .webhook_url
            .as_deref()
            .ok_or(NotifierError::MissingWebhookUrl)?;
        Self::new(webhook_url, &config.client)
    }

    pub fn webhook_url(&self) -> &Url {
        &self.webhook_url
    }

    /// The JSON body posted for a ping: text, then client defaults, then
    /// per-call options, later entries overriding earlier ones.
    pub fn payload(&self, text: &str, options: &DataMap) -> Value {
        let mut body = DataMap::new();
        body.insert("text".to_string(), Value::String(text.to_string()));
        for (key, value) in self.defaults.iter().chain(options.iter()) {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

#[async_trait]
impl WebhookClientTrait for SlackWebhookClient {
    #[instrument(skip_all)]
    async fn ping(&self, text: &str, options: &DataMap) -> anyhow::Result<()> {
        let payload = self.payload(text, options);
        let response = self
            .http
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(res) => {
                if res.status().is_success() {
                    debug!("Successfully posted message to Slack.");
                    Ok(())
                } else {
                    let status = res.status();
                    let text = res.text().await.unwrap_or_default();
                    error!(
                        status = %status,
                        body = %text,
                        "Slack webhook rejected the message"
                    );
                    anyhow::bail!(
                        "Failed to send Slack notification: status {}, body: {}",
                        status,
                        text
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "HTTP request to Slack failed");
                Err(e.into())
            }
        }
    }
}
