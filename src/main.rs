mod config;
mod error;
mod fetch;
mod models;
mod pipeline;
mod providers;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::models::LabelType;
use crate::pipeline::Pipeline;
use crate::storage::{ArtifactStore, FreshnessStore};

#[derive(Parser)]
#[command(name = "stock-ingest", about = "Stock/sector price history and headline collector", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch prices and news for the whole configured universe
    Run {
        /// Ignore the news freshness cache for this run
        #[arg(long)]
        force: bool,
    },

    /// Show news freshness per label and the artifacts on disk
    Status,

    /// List configured symbols and sector proxies
    Universe,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_ingest=info,warn",
        1 => "stock_ingest=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Run { force } => {
            if force {
                info!("--force: news cache ignored for this run");
                config.universe.cache_ttl_hours = 0;
            }

            let _t = utils::Timer::start("Data retrieval");
            let pipeline = Pipeline::new(&config).context("Failed to set up pipeline")?;

            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Ctrl-C received, stopping after the current item");
                    let _ = stop_tx.send(true);
                }
            });

            let report = pipeline.run_until(stop_rx).await;

            println!();
            println!("{}", report);

            if !report.all_succeeded() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Status => {
            let u = &config.universe;
            let store = ArtifactStore::new(&config.storage.output_dir);
            let freshness = FreshnessStore::new(store.root(), u.cache_ttl());
            let artifacts = store.discover_artifacts()?;
            let now = chrono::Utc::now();

            println!("─────────────────────────────────");
            println!("  stock-ingest — {}", store.root().display());
            println!("─────────────────────────────────");
            println!("  Price files : {}", artifacts.price_files.len());
            println!("  News files  : {}", artifacts.news_files.len());
            println!(
                "  Timestamps  : {} ({} labels)",
                freshness.path().display(),
                freshness.snapshot().len()
            );
            println!("  Cache TTL   : {}", utils::fmt_age(freshness.ttl()));
            println!("─────────────────────────────────");

            let labels = u
                .stock_symbols()
                .into_iter()
                .map(|s| (LabelType::Stock, s))
                .chain(u.sector_pairs().into_iter().map(|(_, etf)| (LabelType::Sector, etf)));

            for (label_type, symbol) in labels {
                let (rows, last_bar) = match store.read_price_series(&symbol, label_type) {
                    Ok(Some(series)) => (
                        series.len().to_string(),
                        series.bars.last().map(|b| b.date.to_string()).unwrap_or("—".into()),
                    ),
                    Ok(None) => ("—".into(), "—".into()),
                    Err(e) => {
                        warn!("{}: {}", symbol, e);
                        ("err".into(), "—".into())
                    }
                };
                let headlines = match store.read_headlines(&symbol, label_type) {
                    Ok(Some(h)) => h.len().to_string(),
                    Ok(None) => "—".into(),
                    Err(_) => "err".into(),
                };
                let news = match freshness.last_fetched(&symbol) {
                    Some(at) => {
                        let age = (now - at).to_std().unwrap_or(Duration::ZERO);
                        let state = if freshness.is_fresh(&symbol) { "fresh" } else { "stale" };
                        format!("{} ago ({})", utils::fmt_age(age), state)
                    }
                    None => "never".into(),
                };

                println!(
                    "  {:<6} {:<6} rows {:>5} to {:<10}  headlines {:>3}  news {}",
                    symbol, label_type, rows, last_bar, headlines, news
                );
            }
        }

        Command::Universe => {
            let u = &config.universe;
            let symbols = u.stock_symbols();
            println!("{} stocks:", symbols.len());
            for (sector, members) in &u.sector_members {
                println!("  {:<12} {}", sector, members.join(", "));
            }
            let grouped: Vec<&String> = u.sector_members.values().flatten().collect();
            let ungrouped: Vec<&str> = symbols
                .iter()
                .filter(|s| !grouped.contains(s))
                .map(String::as_str)
                .collect();
            if !ungrouped.is_empty() {
                println!("  {:<12} {}", "(other)", ungrouped.join(", "));
            }

            let sectors = u.sector_pairs();
            println!("{} sector proxies:", sectors.len());
            for (sector, etf) in &sectors {
                println!("  {:<12} {}", sector, etf);
            }
            println!(
                "Window: {} years | news: {} items max, {}h cache",
                u.lookback_years, u.max_news_items, u.cache_ttl_hours
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
