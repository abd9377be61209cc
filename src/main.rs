mod bot;
mod config;
mod error;
mod evaluator;
mod feed;
mod model;
mod notifier;
mod registry;
mod scheduler;
mod telegram;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use feed::PriceFeed;
use feed::coingecko::CoinGeckoFeed;
use notifier::Notifier;
use notifier::telegram::TelegramNotifier;
use notifier::terminal::TerminalNotifier;
use registry::AlertRegistry;
use telegram::TelegramClient;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "price-alert-bot", about = "Crypto price alert bot")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    // ── Shared state and collaborators ────────────────────────────────────────
    let registry = Arc::new(AlertRegistry::new());
    let feed: Arc<dyn PriceFeed> = Arc::new(CoinGeckoFeed::new(
        &config.feed.base_url,
        config.feed.requests_per_second,
    ));
    let client = Arc::new(TelegramClient::new(&config.bot.token));

    let notifier: Arc<dyn Notifier> = match config.notifier.kind.as_str() {
        "terminal" => Arc::new(TerminalNotifier),
        _ => Arc::new(TelegramNotifier::new(Arc::clone(&client))),
    };

    // ── Tasks ─────────────────────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let mut task_handles = Vec::new();

    task_handles.push(tokio::spawn(bot::run(
        Arc::clone(&client),
        Arc::clone(&registry),
        Arc::clone(&feed),
        config.general.currency.clone(),
        config.bot.poll_timeout_secs,
        cancel.clone(),
    )));

    task_handles.push(tokio::spawn(scheduler::run(
        Arc::clone(&registry),
        Arc::clone(&feed),
        notifier,
        Duration::from_secs(config.general.poll_interval_secs),
        config.general.currency.clone(),
        cancel.clone(),
    )));

    info!(
        poll_interval_secs = config.general.poll_interval_secs,
        currency = %config.general.currency,
        notifier = %config.notifier.kind,
        "price alert bot started"
    );

    // ── Shutdown ──────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .change_context(AppError::Runtime)?;

    info!("ctrl+c received, shutting down");
    cancel.cancel();

    for handle in task_handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
