use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;
use validator::Validate;

use crate::models::SiteConfig;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sites: Vec<SiteConfig>,
    pub scraper: ScraperConfig,
    pub extractor: ExtractorConfig,
    pub history: HistoryConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub accept_language: String,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Pause between consecutive site fetches.
    pub request_delay_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
            accept_language: "uk-UA,uk;q=0.9,ru;q=0.8,en-US;q=0.7,en;q=0.6".to_string(),
            request_timeout: 15,
            request_delay_ms: 2000,
            retry_attempts: 1,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Generic price containers, in priority order.
    pub selectors: Vec<String>,
    /// Full-text fallback ignores numbers at or below this value.
    pub min_fallback_price: Decimal,
    pub out_of_stock_markers: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            selectors: [
                r#"[itemprop="price"]"#,
                ".price",
                ".product-price",
                ".price__value",
                ".product__price",
                ".price-new",
                ".price_value",
                ".product-prices__big",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_fallback_price: Decimal::TEN,
            out_of_stock_markers: vec![
                "немає в наявності".to_string(),
                "нет в наличии".to_string(),
                "out of stock".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("history.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Label printed after every price.
    pub currency: String,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            currency: "UAH".to_string(),
            telegram: None,
            discord: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Daily-rolling log files go here when set.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    pub fn load(config_dir: &Path) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(config_dir.join("default")).required(false))
            // Local overrides (ignored by git)
            .add_source(File::from(config_dir.join("local")).required(false))
            // Environment variables, e.g. PRICEWATCH__SCRAPER__REQUEST_TIMEOUT
            .add_source(
                Environment::with_prefix("PRICEWATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Plain Telegram variables, as kept in a .env next to the binary
        if config.notifications.telegram.is_none() {
            if let (Ok(bot_token), Ok(chat_id)) =
                (env::var("TELEGRAM_BOT_TOKEN"), env::var("TELEGRAM_CHAT_ID"))
            {
                config.notifications.telegram = Some(TelegramConfig {
                    bot_token,
                    chat_id,
                    api_base: default_telegram_api(),
                });
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sites.is_empty() {
            return Err(AppError::Validation("At least one site must be configured".into()));
        }

        for site in &self.sites {
            site.validate()?;
        }

        for (index, site) in self.sites.iter().enumerate() {
            if self.sites[..index].iter().any(|other| other.key == site.key) {
                return Err(AppError::Validation(format!("Duplicate site key '{}'", site.key)));
            }
        }

        if self.scraper.request_timeout == 0 {
            return Err(AppError::Validation(
                "Scraper request_timeout must be greater than 0".into(),
            ));
        }

        if self.extractor.min_fallback_price.is_sign_negative() {
            return Err(AppError::Validation(
                "Extractor min_fallback_price cannot be negative".into(),
            ));
        }

        if let Some(telegram) = &self.notifications.telegram {
            if telegram.bot_token.trim().is_empty() || telegram.chat_id.trim().is_empty() {
                return Err(AppError::Validation(
                    "Telegram bot_token and chat_id must be set".into(),
                ));
            }
            if Url::parse(&telegram.api_base).is_err() {
                return Err(AppError::Validation("Invalid Telegram api_base URL".into()));
            }
        }

        if let Some(discord) = &self.notifications.discord {
            if !discord.webhook_url.starts_with("https://discord.com/api/webhooks/") {
                return Err(AppError::Validation("Invalid Discord webhook URL format".into()));
            }
        }

        Ok(())
    }
}
