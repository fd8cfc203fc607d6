// Shared fixtures for the integration tests

pub mod pipeline_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use pricewatch::config::AppConfig;
use pricewatch::models::SiteConfig;
use pricewatch::plugins::{NotificationResult, NotifierPlugin, PluginManager};
use pricewatch::{AppError, PageFetcher, PriceMonitor, Result};

/// Serves canned markup per URL; unknown URLs behave like an unreachable site.
pub struct FakeFetcher {
    pages: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, markup)| (url.to_string(), markup.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| AppError::Fetch {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Keeps every delivered message for later assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(NotificationResult::delivered(None))
    }
}

pub const KRUTI: &str = "https://kruti.example/tire";
pub const ROZETKA: &str = "https://rozetka.example/tire";
pub const VELIKI: &str = "https://veliki.example/tire";

pub fn test_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig::new("kruti", KRUTI, "Kruti"),
        SiteConfig::new("rozetka", ROZETKA, "Rozetka").with_selectors(&[".product-prices__big"]),
        SiteConfig::new("veliki", VELIKI, "Veliki"),
    ]
}

/// Test configuration for integration tests
pub fn get_test_config(history: &Path) -> AppConfig {
    let mut config = AppConfig {
        sites: test_sites(),
        ..AppConfig::default()
    };
    config.scraper.request_delay_ms = 0;
    config.scraper.retry_attempts = 0;
    config.history.path = history.to_path_buf();
    config
}

pub fn json_ld_page(price: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">
        {{"@type": "Product", "name": "Schwalbe",
          "offers": {{"@type": "Offer", "price": "{}", "priceCurrency": "UAH"}}}}
        </script></head><body><h1>Schwalbe Smart Sam</h1></body></html>"#,
        price
    )
}

pub fn selector_page(price: &str) -> String {
    format!(
        r#"<html><body><p class="product-prices__big">{}<span>₴</span></p></body></html>"#,
        price
    )
}

pub async fn create_test_monitor(
    config: &AppConfig,
    pages: &[(&str, String)],
) -> anyhow::Result<(PriceMonitor, RecordingNotifier)> {
    let recorder = RecordingNotifier::default();
    let notifiers = PluginManager::new();
    notifiers.register_notifier(Box::new(recorder.clone())).await;

    let monitor = PriceMonitor::new(config, Box::new(FakeFetcher::new(pages)), notifiers)?;
    Ok((monitor, recorder))
}
