//! In-memory sources for fetcher and pipeline tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FetchError;
use crate::models::{Article, PriceBar};
use crate::providers::{MarketDataSource, NewsSource};

pub fn bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Days::new(i as u64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 * (i as u64 + 1),
            }
        })
        .collect()
}

pub fn article(title: &str, lang: &str) -> Article {
    Article {
        title: title.to_string(),
        lang: lang.to_string(),
    }
}

/// Serves canned bars per symbol; unknown symbols fail.
#[derive(Default)]
pub struct FakeMarket {
    series: HashMap<String, Vec<PriceBar>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeMarket {
    pub fn with(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.series.insert(symbol.to_string(), bars);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(symbol.to_string());
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::provider("fake", format!("{}: unknown symbol", symbol)))
    }
}

/// Serves canned articles per keyword; unknown keywords fail.
#[derive(Default)]
pub struct FakeNews {
    articles: HashMap<String, Vec<Article>>,
    calls: AtomicUsize,
}

impl FakeNews {
    pub fn with(mut self, keyword: &str, articles: Vec<Article>) -> Self {
        self.articles.insert(keyword.to_string(), articles);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for FakeNews {
    async fn search_articles(
        &self,
        keyword: &str,
        max_items: usize,
        _dedupe: bool,
    ) -> Result<Vec<Article>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.articles
            .get(keyword)
            .map(|a| a.iter().take(max_items).cloned().collect())
            .ok_or_else(|| FetchError::provider("fake", format!("{}: unknown keyword", keyword)))
    }
}
