use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pricewatch::config::LoggingConfig;
use pricewatch::plugins::PluginManager;
use pricewatch::plugins::notifiers::{DiscordNotifier, TelegramNotifier};
use pricewatch::{AppConfig, HttpFetcher, PriceMonitor, RunMode};

/// Checks every configured store for the lowest price and reports drops.
///
/// Without a mode flag a one-off report is sent and nothing is stored.
#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about)]
struct Cli {
    /// Record the current lowest price as today's baseline
    #[arg(long, conflicts_with = "afternoon")]
    morning: bool,

    /// Compare against this morning's price and the all-time low
    #[arg(long)]
    afternoon: bool,

    /// Directory holding default.toml and an optional local.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Override the history file location
    #[arg(long)]
    history: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pricewatch={}", logging.level)));
    // stdout is reserved for console notifications
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "pricewatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config_dir).with_context(|| {
        format!("Failed to load configuration from {}", cli.config_dir.display())
    })?;
    if let Some(path) = cli.history {
        config.history.path = path;
    }

    let _guard = init_tracing(&config.logging);
    let mode = RunMode::from_flags(cli.morning, cli.afternoon);
    info!("Starting pricewatch in {} mode", mode);

    let notifiers = PluginManager::new();
    if let Some(telegram) = &config.notifications.telegram {
        notifiers
            .register_notifier(Box::new(TelegramNotifier::new(telegram.clone())?))
            .await;
    }
    if let Some(discord) = &config.notifications.discord {
        notifiers
            .register_notifier(Box::new(DiscordNotifier::new(discord.clone())?))
            .await;
    }
    notifiers.ensure_default_notifier().await;
    info!("Notifying via {:?}", notifiers.list_notifier_types().await);

    let fetcher = HttpFetcher::new(config.scraper.clone())?;
    let monitor = PriceMonitor::new(&config, Box::new(fetcher), notifiers)?;

    let report = monitor.run(mode).await;
    if report.notification.is_some() && report.deliveries == 0 {
        warn!("Notification was not delivered to any channel");
    }
    info!(
        "Done: {} of {} sites priced, best {:?}",
        report.aggregate.priced_count(),
        report.aggregate.quotes.len(),
        report.aggregate.best_price()
    );

    Ok(())
}
