use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::DiscordConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

/// Discord rejects webhook content longer than this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

pub struct DiscordNotifier {
    client: Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn create_webhook_payload(&self, message: &str) -> serde_json::Value {
        let content: String = message.chars().take(MAX_CONTENT_CHARS).collect();
        let mut payload = json!({ "content": content });

        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }

        payload
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn plugin_type(&self) -> &str {
        "discord"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&self.create_webhook_payload(message))
            .send()
            .await
            .map_err(|e| AppError::Notification {
                channel: "discord".to_string(),
                message: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    "request failed".to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification {
                channel: "discord".to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(NotificationResult::delivered(None))
    }
}
