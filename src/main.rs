use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use pricedrop_watcher::{AppConfig, AppError};
use pricedrop_watcher::core::database::{ProductStore, SqliteProductStore};
use pricedrop_watcher::extractor::HttpExtractor;
use pricedrop_watcher::models::format_price;
use pricedrop_watcher::plugins::NotifierRegistry;
use pricedrop_watcher::product_manager::{ProductManager, RefreshReport};
use pricedrop_watcher::scheduler::{RefreshScheduler, format_countdown};
use pricedrop_watcher::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "pricedrop-watcher")]
#[command(about = "Track product listings and alert when their price drops")]
struct Cli {
    /// Directory holding default.toml and friends
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a listing and start tracking it
    Add { url: String },

    /// Stop tracking a listing
    Remove { url: String },

    /// Show every tracked listing
    List,

    /// Run one refresh cycle now
    Refresh,

    /// Refresh on a timer until Ctrl-C; press Enter to refresh immediately
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_dir(&cli.config_dir).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    let store = SqliteProductStore::connect(&config.database)
        .await
        .context("Failed to open product database")?;
    store.init().await?;

    let extractor = HttpExtractor::new(&config.scraper)?;
    let notifier = NotifierRegistry::from_config(&config.notifications, reqwest::Client::new());
    info!("Notification sinks: {:?}", notifier.list_sinks());

    let manager = Arc::new(ProductManager::new(
        Arc::new(store),
        Arc::new(extractor),
        Arc::new(notifier),
    ));
    let symbol = config.notifications.currency_symbol.as_str();

    match cli.command {
        Commands::Add { url } => {
            let product = manager.add_product(&url).await?;
            println!("Tracking {} at {}", product.title, format_price(product.current_price, symbol));
        }
        Commands::Remove { url } => {
            if manager.remove_product(&url).await? {
                println!("Removed {}", url.trim());
            } else {
                println!("{} was not being tracked", url.trim());
            }
        }
        Commands::List => {
            let products = manager.list_products().await?;
            if products.is_empty() {
                println!("No products tracked yet");
            }
            for product in products {
                let used = if product.has_alt_price() {
                    format_price(product.alt_price, symbol)
                } else {
                    "n/a".to_string()
                };
                println!(
                    "{}\n  {}\n  current {}  low {}  high {}  used {}  updated {}",
                    product.title,
                    product.url,
                    format_price(product.current_price, symbol),
                    format_price(product.lowest_price, symbol),
                    format_price(product.highest_price, symbol),
                    used,
                    product.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
                );
            }
        }
        Commands::Refresh => {
            let report = manager.refresh_all().await?;
            print_report(&report);
        }
        Commands::Watch => {
            let mut scheduler = RefreshScheduler::new(Arc::clone(&manager), config.scheduler.clone());
            scheduler.start()?;

            let mut countdown = scheduler.countdown();
            let ticker = tokio::spawn(async move {
                while countdown.changed().await.is_ok() {
                    let remaining = *countdown.borrow_and_update();
                    tracing::debug!("{}", format_countdown(remaining));
                }
            });

            // Manual refreshes go through the running scheduler so they share
            // its guard with the timer.
            println!("Watching. Press Enter to refresh now, Ctrl-C to stop.");
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let mut stdin_open = true;

            loop {
                tokio::select! {
                    signal = tokio::signal::ctrl_c() => {
                        signal?;
                        break;
                    }
                    line = stdin.next_line(), if stdin_open => match line? {
                        Some(_) => match scheduler.trigger_now().await {
                            Ok(report) => print_report(&report),
                            Err(AppError::RefreshInProgress) => println!("A refresh is already running"),
                            Err(e) => tracing::error!("Manual refresh failed: {}", e),
                        },
                        None => stdin_open = false,
                    },
                }
            }

            info!("Shutting down...");
            ticker.abort();
            scheduler.shutdown();
        }
    }

    Ok(())
}

fn print_report(report: &RefreshReport) {
    println!(
        "Checked {} products: {} updated, {} alerts sent, {} failed ({}ms)",
        report.checked,
        report.updated,
        report.notified,
        report.failures.len(),
        report.total_time_ms
    );
    for failure in &report.failures {
        println!("  {}: {}", failure.url, failure.error);
    }
}
