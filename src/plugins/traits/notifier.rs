use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    /// The channel answered but refused the message.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// A channel that can deliver a plain-text message (Telegram, Discord, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Deliver one message. Transport failures are `AppError::Notification`;
    /// a refusal reported by the channel itself is an unsuccessful result.
    async fn notify(&self, message: &str) -> Result<NotificationResult>;
}
