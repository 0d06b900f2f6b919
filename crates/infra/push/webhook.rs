use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::domain::{
    repositories::push_providers::PushProvider, value_objects::notifications::PushMessage,
};

/// Posts each notification as JSON to a configured endpoint (a mobile push
/// relay, a mail bridge, a chat webhook).
pub struct WebhookPushProvider {
    webhook_url: Url,
    client: Client,
}

impl WebhookPushProvider {
    pub fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl PushProvider for WebhookPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({
                "notification_id": message.notification_id,
                "recipient_id": message.recipient_id,
                "type": message.notification_type,
                "title": truncate(&message.title, TITLE_LIMIT),
                "message": truncate(&message.message, MESSAGE_LIMIT),
                "link": message.link,
                "created_at": message.created_at,
            }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "push webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn provider_name(&self) -> &'static str {
        "webhook"
    }
}

const TITLE_LIMIT: usize = 120;
const MESSAGE_LIMIT: usize = 1000;

// Webhook URLs usually embed a secret, so reqwest errors (which echo the
// URL) are never surfaced verbatim.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("push webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("push webhook connection failed");
    }
    anyhow!("push webhook request failed")
}

fn truncate(content: &str, limit: usize) -> String {
    const SUFFIX: char = '…';

    if content.chars().count() <= limit {
        return content.to_string();
    }

    let mut truncated: String = content.chars().take(limit.saturating_sub(1)).collect();
    truncated.push(SUFFIX);
    truncated
}
