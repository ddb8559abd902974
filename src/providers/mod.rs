pub mod cleaner;
pub mod event_registry;
pub mod http_client;
pub mod yahoo;

use crate::error::FetchError;
use crate::models::{Article, PriceBar};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use self::event_registry::EventRegistrySource;
pub use self::yahoo::YahooChartSource;

// ── Source traits ─────────────────────────────────────────────────────────────

/// Swappable OHLCV provider.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars for `symbol` over `[start, end)`.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError>;
}

/// Swappable news search provider.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Up to `max_items` articles matching `keyword`, newest first.
    async fn search_articles(
        &self,
        keyword: &str,
        max_items: usize,
        dedupe: bool,
    ) -> Result<Vec<Article>, FetchError>;
}
