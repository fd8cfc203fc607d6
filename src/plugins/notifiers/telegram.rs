use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::TelegramConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Delivers messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn create_payload(&self, message: &str) -> serde_json::Value {
        json!({
            "chat_id": self.config.chat_id,
            "text": message,
            "disable_web_page_preview": true
        })
    }

    fn error(&self, message: impl Into<String>) -> AppError {
        AppError::Notification {
            channel: self.plugin_type().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        // The request URL embeds the bot token, keep it out of error text
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.create_payload(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.error("request timed out")
                } else if e.is_connect() {
                    self.error("connection failed")
                } else {
                    self.error("request failed")
                }
            })?;

        let status = response.status();
        let body: SendMessageResponse = response
            .json()
            .await
            .map_err(|_| self.error(format!("unexpected response (HTTP {})", status.as_u16())))?;

        if !body.ok {
            return Ok(NotificationResult::rejected(
                body.description
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }

        Ok(NotificationResult::delivered(
            body.result.map(|sent| sent.message_id.to_string()),
        ))
    }
}
