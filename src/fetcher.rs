use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// Retrieves raw page markup for a URL.
///
/// Implementations must give up within a bounded time and report the
/// failure instead of hanging.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
    config: ScraperConfig,
}

impl HttpFetcher {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        let language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            AppError::Validation(format!("Invalid accept_language header: {}", e))
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("Failed to read body: {}", e),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let strategy = FixedInterval::from_millis(self.config.retry_delay_ms)
            .take(self.config.retry_attempts as usize);

        let mut attempt = 0u32;
        let result = Retry::spawn(strategy, move || {
            attempt += 1;
            if attempt > 1 {
                debug!("Retrying {} (attempt {})", url, attempt);
            }
            self.fetch_once(url)
        })
        .await;

        if let Err(e) = &result {
            warn!("Request failed for {}: {}", url, e);
        }
        result
    }
}
