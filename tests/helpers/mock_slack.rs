//! A mock webhook client for testing notifier integration.

use async_trait::async_trait;
use slack_exception_notifier::core::DataMap;
use slack_exception_notifier::notification::slack::WebhookClientTrait;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct MockWebhookClient {
    pub sent_messages: Arc<Mutex<Vec<DataMap>>>,
}

impl MockWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sent_messages(&self) -> Vec<DataMap> {
        self.sent_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookClientTrait for MockWebhookClient {
    async fn ping(&self, _text: &str, options: &DataMap) -> anyhow::Result<()> {
        self.sent_messages.lock().unwrap().push(options.clone());
        Ok(())
    }
}
