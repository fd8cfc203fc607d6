use async_trait::async_trait;

use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::Result;

/// Prints messages to stdout. Used when no remote channel is configured.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifierPlugin for ConsoleNotifier {
    fn name(&self) -> &str {
        "Console Notifier"
    }

    fn plugin_type(&self) -> &str {
        "console"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        println!("{}\n", message);
        Ok(NotificationResult::delivered(None))
    }
}
