use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{AggregateResult, HistoryRecord, PriceQuote};

/// Which baseline policy governs the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Morning,
    Afternoon,
    #[default]
    Quick,
}

impl RunMode {
    pub fn from_flags(morning: bool, afternoon: bool) -> Self {
        match (morning, afternoon) {
            (true, _) => RunMode::Morning,
            (false, true) => RunMode::Afternoon,
            (false, false) => RunMode::Quick,
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunMode::Morning => "morning",
            RunMode::Afternoon => "afternoon",
            RunMode::Quick => "quick",
        };
        f.write_str(name)
    }
}

/// What a run should do after comparing prices with the stored baselines.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub notification: Option<String>,
    /// Whether the (possibly updated) history must be written back.
    pub persist: bool,
}

impl Outcome {
    fn silent() -> Self {
        Self {
            notification: None,
            persist: false,
        }
    }

    fn notify(message: String, persist: bool) -> Self {
        Self {
            notification: Some(message),
            persist,
        }
    }
}

pub struct Comparator {
    currency: String,
}

impl Comparator {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Applies the run-mode policy, updating `history` in place.
    pub fn evaluate(
        &self,
        mode: RunMode,
        aggregate: &AggregateResult,
        history: &mut HistoryRecord,
    ) -> Outcome {
        let best = aggregate
            .best
            .as_ref()
            .and_then(|quote| quote.value.map(|price| (quote, price)));

        match mode {
            RunMode::Morning => self.morning(best, history),
            RunMode::Afternoon => self.afternoon(best, history),
            RunMode::Quick => self.quick(best, aggregate),
        }
    }

    fn morning(
        &self,
        best: Option<(&PriceQuote, Decimal)>,
        history: &mut HistoryRecord,
    ) -> Outcome {
        let Some((quote, price)) = best else {
            return Outcome::notify(
                "❗️ Morning check: no store is showing a price right now (item unavailable)."
                    .to_string(),
                false,
            );
        };

        history.morning_price = Some(price);
        let message = format!(
            "🌅 Morning check\n{}Lowest current price: {}\nStore: {}\n{}",
            product_line(quote),
            self.format_price(price),
            quote.display_name,
            quote.url
        );
        Outcome::notify(message, true)
    }

    fn afternoon(
        &self,
        best: Option<(&PriceQuote, Decimal)>,
        history: &mut HistoryRecord,
    ) -> Outcome {
        let Some((quote, price)) = best else {
            info!("Afternoon: no available prices, nothing to do");
            return Outcome::silent();
        };

        let mut lines = vec![format!(
            "📉 Afternoon check\n{}Store: {}\n{}",
            product_line(quote),
            quote.display_name,
            quote.url
        )];
        let mut dropped = false;

        if let Some(morning) = history.morning_price {
            if price < morning {
                lines.push(format!(
                    "— Below this morning: {} → {}",
                    self.format_amount(morning),
                    self.format_price(price)
                ));
                dropped = true;
            }
        }

        let previous_min = history.min_all_time;
        if previous_min.is_none_or(|min| price < min) {
            lines.push(format!(
                "— New all-time low: {} → {}",
                previous_min.map_or_else(|| "—".to_string(), |min| self.format_amount(min)),
                self.format_price(price)
            ));
            history.min_all_time = Some(price);
            dropped = true;
        }

        if dropped {
            Outcome::notify(lines.join("\n"), true)
        } else {
            info!(
                "No new low. Current {}, morning {:?}, all-time {:?}",
                price, history.morning_price, history.min_all_time
            );
            Outcome {
                notification: None,
                persist: true,
            }
        }
    }

    fn quick(
        &self,
        best: Option<(&PriceQuote, Decimal)>,
        aggregate: &AggregateResult,
    ) -> Outcome {
        let Some((quote, price)) = best else {
            return Outcome::notify("No store currently has the item.".to_string(), false);
        };

        let mut message = format!(
            "Current lowest price: {}\n{}Store: {}\n{}",
            self.format_price(price),
            product_line(quote),
            quote.display_name,
            quote.url
        );

        if aggregate.quotes.len() > 1 {
            message.push_str("\n\nAll stores:");
            for other in &aggregate.quotes {
                message.push('\n');
                message.push_str(&self.breakdown_line(other));
            }
        }
        Outcome::notify(message, false)
    }

    fn breakdown_line(&self, quote: &PriceQuote) -> String {
        match (quote.value, quote.in_stock) {
            (Some(value), true) => {
                format!("• {}: {}", quote.display_name, self.format_price(value))
            }
            (Some(value), false) => format!(
                "• {}: {} (out of stock)",
                quote.display_name,
                self.format_price(value)
            ),
            (None, _) => format!("• {}: no price", quote.display_name),
        }
    }

    pub fn format_price(&self, value: Decimal) -> String {
        format!("{} {}", self.format_amount(value), self.currency)
    }

    fn format_amount(&self, value: Decimal) -> String {
        format!("{:.2}", value)
    }
}

fn product_line(quote: &PriceQuote) -> String {
    quote
        .title
        .as_deref()
        .map(|title| format!("Product: {}\n", title))
        .unwrap_or_default()
}
