//! Retrieval orchestrator: ties providers → fetchers → output directory.
//!
//! One run walks the universe strictly in order:
//!   1. every stock symbol: prices, then news (label type `stock`)
//!   2. every sector proxy: prices, then news (label type `sector`)
//!
//! Per-item failures are logged and counted as missing; the run always
//! continues to the next item and never retries within the same run.

pub mod summary;

use crate::config::{AppConfig, UniverseConfig};
use crate::fetch::{NewsFetcher, PriceFetcher};
use crate::models::{DateWindow, FetchOutcome, LabelType, PriceSeries};
use crate::providers::{EventRegistrySource, MarketDataSource, NewsSource, YahooChartSource};
use crate::storage::{ArtifactStore, FreshnessStore};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub use self::summary::SummaryReport;

/// One label to process, with the name used in progress lines.
struct WorkItem {
    symbol: String,
    display: String,
}

pub struct Pipeline {
    universe: UniverseConfig,
    prices: PriceFetcher,
    news: NewsFetcher,
}

impl Pipeline {
    /// Build with the live Yahoo and Event Registry sources.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let market = YahooChartSource::new(&config.market).context("Failed to build market source")?;
        let news = EventRegistrySource::new(&config.news).context("Failed to build news source")?;

        Ok(Self::with_sources(
            config.universe.clone(),
            &config.storage.output_dir,
            Arc::new(market),
            Arc::new(news),
        ))
    }

    pub fn with_sources(
        universe: UniverseConfig,
        output_dir: &Path,
        market: Arc<dyn MarketDataSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        let store = Arc::new(ArtifactStore::new(output_dir));
        let freshness = Arc::new(FreshnessStore::new(output_dir, universe.cache_ttl()));

        Self {
            prices: PriceFetcher::new(market, Arc::clone(&store)),
            news: NewsFetcher::new(news, freshness, store, universe.max_news_items),
            universe,
        }
    }

    pub async fn run(&self) -> SummaryReport {
        let (_tx, rx) = watch::channel(false);
        self.run_until(rx).await
    }

    /// Like [`run`](Self::run), but stops before the next item once
    /// `shutdown` flips to `true`. The item in flight is finished first.
    pub async fn run_until(&self, shutdown: watch::Receiver<bool>) -> SummaryReport {
        let window = DateWindow::lookback(Utc::now().date_naive(), self.universe.lookback_years);

        let stocks: Vec<WorkItem> = self
            .universe
            .stock_symbols()
            .into_iter()
            .map(|s| WorkItem { display: s.clone(), symbol: s })
            .collect();
        let sectors: Vec<WorkItem> = self
            .universe
            .sector_pairs()
            .into_iter()
            .map(|(sector, etf)| WorkItem {
                display: format!("{} ({})", sector, etf),
                symbol: etf,
            })
            .collect();

        let mut report = SummaryReport::new(stocks.len(), sectors.len());
        info!(
            "=== Retrieval: {} stocks, {} sectors, window {} ===",
            stocks.len(),
            sectors.len(),
            window
        );

        let completed = self
            .process_group(LabelType::Stock, &stocks, window, &mut report, &shutdown)
            .await
            && self
                .process_group(LabelType::Sector, &sectors, window, &mut report, &shutdown)
                .await;

        if !completed {
            warn!("Run interrupted, summary is partial");
        }
        report.log_summary();
        report
    }

    /// Returns `false` if the run was interrupted.
    async fn process_group(
        &self,
        label_type: LabelType,
        items: &[WorkItem],
        window: DateWindow,
        report: &mut SummaryReport,
        shutdown: &watch::Receiver<bool>,
    ) -> bool {
        let total = items.len();

        for item in items {
            if *shutdown.borrow() {
                return false;
            }

            let prices = self.prices.fetch(&item.symbol, label_type, window).await;
            record_prices(report, label_type, total, &item.display, prices);

            match self.news.fetch(&item.symbol, label_type).await {
                FetchOutcome::Fetched(batch) => {
                    let n = report.record_news(label_type);
                    info!(
                        "{}/{} {} news retrieved for {} ({} headlines)",
                        n, total, label_type, item.display, batch.len()
                    );
                }
                FetchOutcome::CacheHit => {
                    let n = report.record_news(label_type);
                    info!("{}/{} {} news retrieved for {} (cached)", n, total, label_type, item.display);
                }
                FetchOutcome::Failed(e) => {
                    warn!("{} news missing for {}: {}", label_type, item.display, e);
                }
            }
        }

        true
    }
}

/// Prices have no freshness cache, so only `Fetched` counts as retrieved.
fn record_prices(
    report: &mut SummaryReport,
    label_type: LabelType,
    total: usize,
    display_name: &str,
    outcome: FetchOutcome<PriceSeries>,
) {
    match outcome {
        FetchOutcome::Fetched(series) => {
            let n = report.record_data(label_type);
            info!(
                "{}/{} {} data retrieved for {} ({} rows)",
                n, total, label_type, display_name, series.len()
            );
        }
        FetchOutcome::CacheHit => {
            warn!("{} data missing for {}: no cached prices to reuse", label_type, display_name);
        }
        FetchOutcome::Failed(e) => {
            warn!("{} data missing for {}: {}", label_type, display_name, e);
        }
    }
}
