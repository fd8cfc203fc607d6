use serde::{Deserialize, Serialize};
use validator::Validate;

/// One monitored retailer page.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SiteConfig {
    #[validate(length(min = 1, message = "site key must not be empty"))]
    pub key: String,
    #[validate(url(message = "site url must be a valid URL"))]
    pub url: String,
    #[validate(length(min = 1, message = "display name must not be empty"))]
    pub display_name: String,
    /// Site-specific price selectors, tried before the generic list.
    #[serde(default)]
    pub selectors: Vec<String>,
}

impl SiteConfig {
    pub fn new(key: &str, url: &str, display_name: &str) -> Self {
        Self {
            key: key.to_string(),
            url: url.to_string(),
            display_name: display_name.to_string(),
            selectors: Vec::new(),
        }
    }

    pub fn with_selectors(mut self, selectors: &[&str]) -> Self {
        self.selectors = selectors.iter().map(|s| s.to_string()).collect();
        self
    }
}
