//! Delivers exception notifications to Slack.
//!
//! `notifier` holds the adapter the host application calls; `slack` holds
//! the webhook client it delegates delivery to. The two meet at
//! [`slack::WebhookClientTrait`], so any transport can be injected.
pub mod notifier;
pub mod slack;

use thiserror::Error;

/// Errors raised while building the notifier or formatting a notification.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("webhook_url is not configured")]
    MissingWebhookUrl,

    #[error("invalid webhook URL '{url}': {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    #[error("failed to build webhook HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("unable to determine the local hostname")]
    Hostname,

    #[error("failed to serialize message payload: {0}")]
    Payload(#[from] serde_json::Error),
}
