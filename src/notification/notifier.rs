//! The notifier is the entry point for the host application's exception
//! pipeline: it formats an exception into a Slack attachment and hands the
//! message to a webhook client.
//!
//! A notifier whose client could not be built is inert. It accepts every
//! call and sends nothing, so a bad webhook URL never takes the host
//! application down with it.

use crate::config::{NotifierConfig, PostCallback, PreCallback};
use crate::core::{Clock, DataMap, ExceptionReport, HostnameProvider, NotificationContext};
use crate::formatting::SlackMessageFormatter;
use crate::notification::slack::{SlackWebhookClient, WebhookClientTrait};
use crate::notification::NotifierError;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

enum Delivery {
    Active(Arc<dyn WebhookClientTrait>),
    Inert,
}

/// Formats exceptions and posts them to Slack.
pub struct SlackNotifier {
    formatter: SlackMessageFormatter,
    message_opts: DataMap,
    delivery: Delivery,
    pre_callback: Option<PreCallback>,
    post_callback: Option<PostCallback>,
}

impl SlackNotifier {
    /// Builds a notifier backed by a [`SlackWebhookClient`].
    ///
    /// Fails if the webhook URL is missing or invalid, or the HTTP client
    /// cannot be created.
    pub fn try_new(config: NotifierConfig) -> Result<Self, NotifierError> {
        let client = SlackWebhookClient::from_config(&config)?;
        Ok(Self::build(config, Delivery::Active(Arc::new(client))))
    }

    /// Builds a notifier, falling back to an inert one if the webhook
    /// client cannot be constructed.
    pub fn new(config: NotifierConfig) -> Self {
        match SlackWebhookClient::from_config(&config) {
            Ok(client) => Self::build(config, Delivery::Active(Arc::new(client))),
            Err(e) => {
                warn!(error = %e, "Slack notifier disabled: webhook client could not be created");
                Self::build(config, Delivery::Inert)
            }
        }
    }

    /// Builds a notifier that delivers through `client`.
    pub fn with_client(config: NotifierConfig, client: Arc<dyn WebhookClientTrait>) -> Self {
        Self::build(config, Delivery::Active(client))
    }

    fn build(config: NotifierConfig, delivery: Delivery) -> Self {
        let (color, message_opts) = config.message_options();
        let formatter =
            SlackMessageFormatter::new(color, config.backtrace_lines, config.ignore_data_if);
        Self {
            formatter,
            message_opts,
            delivery,
            pre_callback: config.pre_callback,
            post_callback: config.post_callback,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.formatter = self.formatter.with_clock(clock);
        self
    }

    pub fn with_hostname_provider(mut self, hostname: Arc<dyn HostnameProvider>) -> Self {
        self.formatter = self.formatter.with_hostname_provider(hostname);
        self
    }

    /// Whether the notifier has a client to deliver through.
    pub fn is_valid(&self) -> bool {
        matches!(self.delivery, Delivery::Active(_))
    }

    /// The full message body that would be sent for `exception`.
    pub fn build_message(
        &self,
        exception: &ExceptionReport,
        context: &NotificationContext,
    ) -> Result<DataMap, NotifierError> {
        let attachment = self.formatter.attachment(exception, context)?;
        let mut body = self.message_opts.clone();
        body.insert(
            "attachments".to_string(),
            serde_json::to_value(vec![attachment])?,
        );
        Ok(body)
    }

    /// Sends a notification for `exception`.
    ///
    /// Delivery failures are logged and otherwise ignored. Errors are only
    /// returned when the message itself cannot be built.
    #[instrument(skip_all, fields(exception = %exception.type_name))]
    pub async fn notify(
        &self,
        exception: &ExceptionReport,
        context: &NotificationContext,
    ) -> Result<(), NotifierError> {
        let client = match &self.delivery {
            Delivery::Active(client) => client,
            Delivery::Inert => {
                debug!("Slack notifier is inert, dropping notification.");
                return Ok(());
            }
        };

        let mut body = self.build_message(exception, context)?;
        if let Some(callback) = &self.pre_callback {
            callback(exception, &mut body);
        }

        match client.ping("", &body).await {
            Ok(()) => info!("Exception notification sent to Slack."),
            Err(e) => warn!(error = %e, "Failed to deliver exception notification"),
        }

        if let Some(callback) = &self.post_callback {
            callback(exception, &body);
        }

        Ok(())
    }
}
