use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::fmt;

use crate::error::FetchError;

/// Language code the news provider uses for English articles.
pub const ENGLISH: &str = "eng";

// ── Label type ────────────────────────────────────────────────────────────────

/// Namespaces file names and keys; fetch logic is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelType {
    Stock,
    Sector,
}

impl LabelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Sector => "sector",
        }
    }

    /// Header of the symbol tag column in the price CSV.
    pub fn tag_column(&self) -> &'static str {
        match self {
            Self::Stock => "Ticker",
            Self::Sector => "ETF",
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ── Prices ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily history for one symbol, ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub label_type: LabelType,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, label_type: LabelType, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self {
            symbol: symbol.into(),
            label_type,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Half-open date range `[start, end)` requested from the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// `[today - years * 365 days, today)`.
    pub fn lookback(today: NaiveDate, years: u32) -> Self {
        let days = u64::from(years) * 365;
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

// ── News ──────────────────────────────────────────────────────────────────────

/// One article as returned by the news provider. Only the fields we use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lang: String,
}

impl Article {
    pub fn is_english(&self) -> bool {
        self.lang == ENGLISH
    }
}

/// Headlines retained for one label after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsBatch {
    pub label: String,
    pub label_type: LabelType,
    pub headlines: Vec<String>,
}

impl NewsBatch {
    pub fn len(&self) -> usize {
        self.headlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headlines.is_empty()
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Result of one fetch attempt, as seen by the orchestrator.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Fetched(T),
    CacheHit,
    Failed(FetchError),
}
