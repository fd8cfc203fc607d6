pub mod aggregator;
pub mod comparator;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod history;
pub mod models;
pub mod monitor;
pub mod normalizer;
pub mod plugins;
pub mod utils;

// Re-export commonly used types
pub use crate::comparator::{Comparator, Outcome, RunMode};
pub use crate::config::AppConfig;
pub use crate::extractor::PriceExtractor;
pub use crate::fetcher::{HttpFetcher, PageFetcher};
pub use crate::history::HistoryStore;
pub use crate::monitor::{PriceMonitor, RunReport};
pub use crate::utils::error::{AppError, Result};
