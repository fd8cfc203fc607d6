use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::models::{ExtractionMethod, PriceQuote, SiteConfig};
use crate::normalizer::normalize;
use crate::utils::error::Result;

const ITEMPROP_META_SELECTORS: [&str; 2] = [r#"meta[itemprop="price"]"#, r#"meta[name="price"]"#];
const OG_META_SELECTORS: [&str; 2] = [
    r#"meta[property="product:price:amount"]"#,
    r#"meta[property="og:price:amount"]"#,
];
const HIDDEN_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "aside"];

/// Containers that hold the product on sale rather than listings around it.
const PRODUCT_SCOPE_SELECTORS: [&str; 4] = [
    r#"[itemtype*="schema.org/Product"]"#,
    "#product",
    ".product-info",
    ".product__info",
];

// Class or id fragments of carousels showing other goods.
const UNRELATED_HINTS: [&str; 5] = ["related", "recommend", "similar", "viewed", "upsell"];

// Grouped thousands ("1 234,56") or a plain run of digits and separators.
const NUMBER_PATTERN: &str =
    r"\d{1,3}(?:[ \x{a0}\x{202f}]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d+)*";

/// Price found in a single page, before it is tied to a site.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Option<Decimal>,
    pub method: ExtractionMethod,
    pub in_stock: bool,
    /// Product name from structured data, else the page heading.
    pub title: Option<String>,
}

impl Extraction {
    fn found(value: Decimal, method: ExtractionMethod) -> Self {
        Self {
            value: Some(value),
            method,
            in_stock: true,
            title: None,
        }
    }

    fn miss() -> Self {
        Self {
            value: None,
            method: ExtractionMethod::None,
            in_stock: true,
            title: None,
        }
    }
}

/// One `application/ld+json` block; `json` is `None` when it is not valid JSON.
struct StructuredBlock {
    raw: String,
    json: Option<Value>,
}

/// Runs the strategy cascade over raw page markup.
///
/// Strategies are tried in a fixed order (structured data, item-property
/// meta, Open Graph meta, CSS selectors, full text) and the first one that
/// yields a positive price wins. A strategy that trips over malformed input
/// simply reports no match.
///
/// Availability comes from structured data when the page declares it.
/// Otherwise the out-of-stock markers are looked up in the product container
/// (or around the element that held the price), skipping blocks that list
/// other goods.
pub struct PriceExtractor {
    selectors: Vec<String>,
    min_fallback_price: Decimal,
    out_of_stock_markers: Vec<String>,
    currency_suffix: Regex,
    currency_prefix: Regex,
    number_token: Regex,
    json_price: Regex,
}

impl PriceExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            selectors: config.selectors.clone(),
            min_fallback_price: config.min_fallback_price,
            out_of_stock_markers: config
                .out_of_stock_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            currency_suffix: Regex::new(&format!(
                r"(?i)({})\s*(?:грн|гривн\w*|uah|₴)",
                NUMBER_PATTERN
            ))?,
            currency_prefix: Regex::new(&format!(r"(?i)(?:₴|uah)\s*({})", NUMBER_PATTERN))?,
            number_token: Regex::new(NUMBER_PATTERN)?,
            json_price: Regex::new(r#""(?:price|lowPrice)"\s*:\s*"?([\d.,\s]+)"?"#)?,
        })
    }

    pub fn extract(&self, markup: &str) -> Extraction {
        self.run_cascade(markup, &[])
    }

    pub fn extract_for_site(&self, markup: &str, site: &SiteConfig) -> PriceQuote {
        let extraction = self.run_cascade(markup, &site.selectors);
        let mut quote = match extraction.value {
            Some(value) => PriceQuote::found(site, value, extraction.method),
            None => PriceQuote::missing(site),
        };
        quote.in_stock = extraction.in_stock;
        quote.title = extraction.title;
        quote
    }

    fn run_cascade(&self, markup: &str, site_selectors: &[String]) -> Extraction {
        let document = Html::parse_document(markup);
        let blocks = structured_blocks(&document);
        let mut price_element = None;

        let mut extraction = self
            .structured_data_price(&blocks)
            .map(|v| Extraction::found(v, ExtractionMethod::JsonLd))
            .or_else(|| {
                meta_content_price(&document, &ITEMPROP_META_SELECTORS)
                    .map(|v| Extraction::found(v, ExtractionMethod::MetaItemprop))
            })
            .or_else(|| {
                meta_content_price(&document, &OG_META_SELECTORS)
                    .map(|v| Extraction::found(v, ExtractionMethod::MetaOg))
            })
            .or_else(|| {
                self.selector_price(&document, site_selectors).map(|(v, element)| {
                    price_element = Some(element);
                    Extraction::found(v, ExtractionMethod::CssSelector)
                })
            })
            .or_else(|| {
                self.fulltext_price(&visible_text(document.root_element()))
                    .map(|v| Extraction::found(v, ExtractionMethod::FulltextRegex))
            })
            .unwrap_or_else(Extraction::miss);

        extraction.in_stock = self.is_in_stock(&document, &blocks, price_element);
        extraction.title = product_title(&document, &blocks);
        debug!(
            method = %extraction.method,
            value = ?extraction.value,
            in_stock = extraction.in_stock,
            "Extraction cascade finished"
        );
        extraction
    }

    fn structured_data_price(&self, blocks: &[StructuredBlock]) -> Option<Decimal> {
        blocks.iter().find_map(|block| match &block.json {
            Some(json) => find_offer_price(json),
            // Hand-written blocks are often not quite JSON.
            None => self
                .json_price
                .captures_iter(&block.raw)
                .filter_map(|caps| caps.get(1))
                .find_map(|m| normalize(m.as_str())),
        })
    }

    fn selector_price<'a>(
        &self,
        document: &'a Html,
        site_selectors: &[String],
    ) -> Option<(Decimal, ElementRef<'a>)> {
        for raw in site_selectors.iter().chain(self.selectors.iter()) {
            let Ok(selector) = Selector::parse(raw) else {
                debug!("Skipping invalid selector '{}'", raw);
                continue;
            };

            let first = document
                .select(&selector)
                .map(|element| (element_text(element), element))
                .find(|(text, _)| !text.is_empty());

            if let Some((text, element)) = first {
                if let Some(price) = self.fragment_price(&text) {
                    debug!("Price matched selector '{}'", raw);
                    return Some((price, element));
                }
            }
        }
        None
    }

    // A container can hold an old and a new price; the first tagged amount wins.
    fn fragment_price(&self, text: &str) -> Option<Decimal> {
        self.currency_amounts(text).next().or_else(|| normalize(text))
    }

    fn fulltext_price(&self, text: &str) -> Option<Decimal> {
        if let Some(price) = self.currency_amounts(text).next() {
            return Some(price);
        }

        // Assumes the real price is the smallest "big" number on the page.
        self.number_token
            .find_iter(text)
            .filter_map(|m| normalize(m.as_str()))
            .filter(|v| *v > self.min_fallback_price)
            .min()
    }

    fn currency_amounts<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Decimal> + 'a {
        self.currency_suffix
            .captures_iter(text)
            .chain(self.currency_prefix.captures_iter(text))
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| normalize(m.as_str()))
    }

    fn is_in_stock<'a>(
        &self,
        document: &'a Html,
        blocks: &[StructuredBlock],
        price_element: Option<ElementRef<'a>>,
    ) -> bool {
        if let Some(available) = structured_availability(document, blocks) {
            return available;
        }

        let scope = product_scope(document)
            .or_else(|| price_element.map(surroundings))
            .unwrap_or_else(|| document.root_element());
        !self.has_out_of_stock_marker(&visible_text(scope))
    }

    fn has_out_of_stock_marker(&self, text: &str) -> bool {
        if self.out_of_stock_markers.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.out_of_stock_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }
}

fn structured_blocks(document: &Html) -> Vec<StructuredBlock> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|script| {
            let raw = script.text().collect::<String>();
            let json = serde_json::from_str(raw.trim()).ok();
            StructuredBlock { raw, json }
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn meta_content_price(document: &Html, selectors: &[&str]) -> Option<Decimal> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(price) = element.value().attr("content").and_then(normalize) {
                return Some(price);
            }
        }
    }
    None
}

fn first_match<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| document.select(&selector).next())
}

fn product_scope(document: &Html) -> Option<ElementRef<'_>> {
    first_match(document, &PRODUCT_SCOPE_SELECTORS)
}

// Price element plus its siblings and their children.
fn surroundings(element: ElementRef<'_>) -> ElementRef<'_> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(2)
        .last()
        .unwrap_or(element)
}

/// Text a visitor would see inside `scope`, minus script-like containers and
/// listings of other goods.
fn visible_text(scope: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in scope.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != scope.id())
            .filter_map(ElementRef::wrap)
            .any(is_skipped_container);
        let trimmed = text.trim();
        if !skipped && !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join(" ")
}

fn is_skipped_container(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if HIDDEN_TAGS.contains(&el.name()) {
        return true;
    }
    let hinted = |value: Option<&str>| {
        value.is_some_and(|v| {
            let v = v.to_lowercase();
            UNRELATED_HINTS.iter().any(|hint| v.contains(hint))
        })
    };
    hinted(el.attr("class")) || hinted(el.attr("id"))
}

fn structured_availability(document: &Html, blocks: &[StructuredBlock]) -> Option<bool> {
    blocks
        .iter()
        .filter_map(|block| block.json.as_ref())
        .find_map(find_availability)
        .or_else(|| {
            let selector = Selector::parse(r#"[itemprop="availability"]"#).ok()?;
            document.select(&selector).find_map(|element| {
                let el = element.value();
                el.attr("href")
                    .or_else(|| el.attr("content"))
                    .and_then(availability_flag)
            })
        })
}

fn find_availability(value: &Value) -> Option<bool> {
    match value {
        Value::Array(items) => items.iter().find_map(find_availability),
        Value::Object(map) => map
            .get("availability")
            .and_then(Value::as_str)
            .and_then(availability_flag)
            .or_else(|| map.values().find_map(find_availability)),
        _ => None,
    }
}

// schema.org ItemAvailability, as a full URL or a bare name.
fn availability_flag(value: &str) -> Option<bool> {
    let state = value
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .to_ascii_lowercase();
    match state.as_str() {
        "instock" | "limitedavailability" | "instoreonly" | "onlineonly" => Some(true),
        "outofstock" | "soldout" | "discontinued" => Some(false),
        _ => None,
    }
}

fn product_title(document: &Html, blocks: &[StructuredBlock]) -> Option<String> {
    blocks
        .iter()
        .filter_map(|block| block.json.as_ref())
        .find_map(find_product_name)
        .or_else(|| {
            let heading = first_match(document, &["h1"])?;
            let text = heading.text().flat_map(str::split_whitespace).collect::<Vec<_>>();
            (!text.is_empty()).then(|| text.join(" "))
        })
}

fn find_product_name(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product_name),
        Value::Object(map) => {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty());
            match name {
                Some(name) if has_type(value, &["Product", "ProductGroup"]) => {
                    Some(name.to_string())
                }
                _ => map.values().find_map(find_product_name),
            }
        }
        _ => None,
    }
}

fn find_offer_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Array(items) => items.iter().find_map(find_offer_price),
        Value::Object(map) => {
            if let Some(price) = map.get("offers").and_then(offer_price) {
                return Some(price);
            }
            if has_type(value, &["Offer", "AggregateOffer"]) {
                if let Some(price) = offer_price(value) {
                    return Some(price);
                }
            }
            // @graph, mainEntity and friends
            map.iter()
                .filter(|(key, _)| key.as_str() != "offers")
                .find_map(|(_, nested)| find_offer_price(nested))
        }
        _ => None,
    }
}

fn offer_price(offers: &Value) -> Option<Decimal> {
    match offers {
        Value::Array(items) => items.iter().find_map(offer_price),
        Value::Object(map) => ["price", "lowPrice"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(scalar_price)
            .or_else(|| map.get("priceSpecification").and_then(offer_price))
            .or_else(|| map.get("offers").and_then(offer_price)),
        _ => None,
    }
}

fn has_type(value: &Value, names: &[&str]) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => names.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| names.contains(&t)),
        _ => false,
    }
}

fn scalar_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => normalize(s),
        Value::Number(n) => normalize(&n.to_string()),
        _ => None,
    }
}
