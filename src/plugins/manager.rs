use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::notifiers::ConsoleNotifier;
use super::traits::NotifierPlugin;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Ordered set of notification channels; every message goes to all of them.
#[derive(Clone)]
pub struct PluginManager {
    notifiers: Arc<RwLock<Vec<NotifierPluginBox>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) {
        debug!("Registering notifier {}", plugin.plugin_type());
        let mut notifiers = self.notifiers.write().await;
        notifiers.push(plugin);
    }

    /// Falls back to stdout when no channel was configured.
    pub async fn ensure_default_notifier(&self) {
        if self.notifiers.read().await.is_empty() {
            self.register_notifier(Box::new(ConsoleNotifier::new())).await;
        }
    }

    /// List registered notifier types in delivery order
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.iter().map(|n| n.plugin_type().to_string()).collect()
    }

    /// Sends `message` through every notifier and returns how many accepted it.
    /// Failures are logged and never stop the remaining channels.
    pub async fn broadcast(&self, message: &str) -> usize {
        let notifiers = self.notifiers.read().await;
        let mut delivered = 0;

        for notifier in notifiers.iter() {
            match notifier.notify(message).await {
                Ok(result) if result.success => {
                    debug!("{} delivered message {:?}", notifier.name(), result.message_id);
                    delivered += 1;
                }
                Ok(result) => {
                    warn!(
                        "{} rejected message: {}",
                        notifier.name(),
                        result.error.unwrap_or_default()
                    );
                }
                Err(e) => warn!("{} failed: {}", notifier.name(), e),
            }
        }

        delivered
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
