use std::time::Duration;
use tracing::{debug, info, warn};

use crate::extractor::PriceExtractor;
use crate::fetcher::PageFetcher;
use crate::models::{AggregateResult, PriceQuote, SiteConfig};

/// Fetches and prices every site in configuration order.
///
/// Sites are visited one at a time with `request_delay` between fetches. An
/// unreachable site is recorded as a quote without a value and never stops
/// the scan. On equal prices the earlier site keeps the lead.
pub async fn aggregate(
    sites: &[SiteConfig],
    fetcher: &dyn PageFetcher,
    extractor: &PriceExtractor,
    request_delay: Duration,
) -> AggregateResult {
    let mut result = AggregateResult::default();

    for (index, site) in sites.iter().enumerate() {
        if index > 0 && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }

        let quote = match fetcher.fetch(&site.url).await {
            Ok(markup) => extractor.extract_for_site(&markup, site),
            Err(e) => {
                warn!(site = %site.key, "Site unreachable: {}", e);
                PriceQuote::missing(site)
            }
        };

        debug!(
            site = %quote.site_key,
            price = ?quote.value,
            method = %quote.method,
            in_stock = quote.in_stock,
            "Site checked"
        );

        if let Some(price) = quote.offered_price() {
            let is_better = result
                .best_price()
                .is_none_or(|current| price < current);
            if is_better {
                result.best = Some(quote.clone());
            }
        }
        result.quotes.push(quote);
    }

    match &result.best {
        Some(best) => info!(
            "Best price {} at {} ({} of {} sites priced)",
            best.value.unwrap_or_default(),
            best.site_key,
            result.priced_count(),
            result.quotes.len()
        ),
        None => info!("No site returned a price ({} checked)", result.quotes.len()),
    }

    result
}
