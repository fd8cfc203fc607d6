use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SiteConfig;

/// Which cascade strategy produced a price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    JsonLd,
    MetaItemprop,
    MetaOg,
    CssSelector,
    FulltextRegex,
    None,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::JsonLd => "json_ld",
            ExtractionMethod::MetaItemprop => "meta_itemprop",
            ExtractionMethod::MetaOg => "meta_og",
            ExtractionMethod::CssSelector => "css_selector",
            ExtractionMethod::FulltextRegex => "fulltext_regex",
            ExtractionMethod::None => "none",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one extraction attempt for one site.
///
/// `value` is `None` exactly when no strategy produced a price or the page
/// could not be fetched at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub value: Option<Decimal>,
    pub method: ExtractionMethod,
    pub site_key: String,
    pub display_name: String,
    pub url: String,
    pub in_stock: bool,
    /// Product name as the store shows it, when the page names it.
    #[serde(default)]
    pub title: Option<String>,
}

impl PriceQuote {
    pub fn found(site: &SiteConfig, value: Decimal, method: ExtractionMethod) -> Self {
        Self {
            value: Some(value),
            method,
            site_key: site.key.clone(),
            display_name: site.display_name.clone(),
            url: site.url.clone(),
            in_stock: true,
            title: None,
        }
    }

    pub fn missing(site: &SiteConfig) -> Self {
        Self {
            value: None,
            method: ExtractionMethod::None,
            site_key: site.key.clone(),
            display_name: site.display_name.clone(),
            url: site.url.clone(),
            in_stock: true,
            title: None,
        }
    }

    /// Price usable for the minimum: present and in stock.
    pub fn offered_price(&self) -> Option<Decimal> {
        if self.in_stock { self.value } else { None }
    }
}

/// Result of scanning every configured site once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AggregateResult {
    pub best: Option<PriceQuote>,
    pub quotes: Vec<PriceQuote>,
}

impl AggregateResult {
    pub fn best_price(&self) -> Option<Decimal> {
        self.best.as_ref().and_then(|q| q.value)
    }

    pub fn priced_count(&self) -> usize {
        self.quotes.iter().filter(|q| q.value.is_some()).count()
    }
}
