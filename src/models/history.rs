use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted price baselines.
///
/// `min_all_time` only ever moves down once set; `morning_price` is replaced
/// by every morning run that finds a price.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    #[serde(default)]
    pub min_all_time: Option<Decimal>,
    #[serde(default)]
    pub morning_price: Option<Decimal>,
}

impl HistoryRecord {
    pub fn new(min_all_time: Option<Decimal>, morning_price: Option<Decimal>) -> Self {
        Self {
            min_all_time,
            morning_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_all_time.is_none() && self.morning_price.is_none()
    }
}
