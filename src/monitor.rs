use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::aggregator::aggregate;
use crate::comparator::{Comparator, RunMode};
use crate::config::AppConfig;
use crate::extractor::PriceExtractor;
use crate::fetcher::PageFetcher;
use crate::history::HistoryStore;
use crate::models::{AggregateResult, SiteConfig};
use crate::plugins::PluginManager;
use crate::utils::error::Result;

/// Summary of one invocation, for logging and tests.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aggregate: AggregateResult,
    pub notification: Option<String>,
    /// Number of channels that accepted the notification.
    pub deliveries: usize,
    pub history_saved: bool,
}

/// Runs the whole check for one mode: load history, aggregate, compare,
/// notify, persist.
pub struct PriceMonitor {
    sites: Vec<SiteConfig>,
    fetcher: Box<dyn PageFetcher>,
    extractor: PriceExtractor,
    comparator: Comparator,
    history: HistoryStore,
    notifiers: PluginManager,
    request_delay: Duration,
}

impl PriceMonitor {
    pub fn new(
        config: &AppConfig,
        fetcher: Box<dyn PageFetcher>,
        notifiers: PluginManager,
    ) -> Result<Self> {
        Ok(Self {
            sites: config.sites.clone(),
            fetcher,
            extractor: PriceExtractor::new(&config.extractor)?,
            comparator: Comparator::new(config.notifications.currency.clone()),
            history: HistoryStore::new(config.history.path.clone()),
            notifiers,
            request_delay: Duration::from_millis(config.scraper.request_delay_ms),
        })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Never fails; every problem inside a run is logged and reflected in the
    /// report instead.
    pub async fn run(&self, mode: RunMode) -> RunReport {
        let started_at = Utc::now();
        info!("Starting {} check of {} sites", mode, self.sites.len());

        let mut record = self.history.load();
        if record.is_empty() {
            debug!("No baselines recorded yet");
        }
        let aggregate = aggregate(
            &self.sites,
            self.fetcher.as_ref(),
            &self.extractor,
            self.request_delay,
        )
        .await;

        let outcome = self.comparator.evaluate(mode, &aggregate, &mut record);

        let deliveries = match &outcome.notification {
            Some(message) => self.notifiers.broadcast(message).await,
            None => 0,
        };

        let history_saved = if outcome.persist {
            match self.history.save(&record) {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to save history to {}: {}", self.history.path().display(), e);
                    false
                }
            }
        } else {
            false
        };

        let finished_at = Utc::now();
        info!(
            "{} check finished in {} ms (notified: {}, history saved: {})",
            mode,
            (finished_at - started_at).num_milliseconds(),
            outcome.notification.is_some(),
            history_saved
        );

        RunReport {
            mode,
            started_at,
            finished_at,
            aggregate,
            notification: outcome.notification,
            deliveries,
            history_saved,
        }
    }
}
