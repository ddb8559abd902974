//! Daily OHLCV from the Yahoo Finance v8 chart endpoint.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::MarketDataSource;
use super::cleaner::{ChartColumns, chart_columns_to_bars};
use super::http_client::HttpClient;
use crate::config::MarketConfig;
use crate::error::FetchError;
use crate::models::PriceBar;

const PROVIDER: &str = "yahoo";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

// ── Source ────────────────────────────────────────────────────────────────────

pub struct YahooChartSource {
    client: HttpClient,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(config: &MarketConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(PROVIDER, &config.user_agent, &config.http)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// e.g. AAPL → /v8/finance/chart/AAPL?period1=…&period2=…&interval=1d
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .map_err(|e| FetchError::Config(format!("bad market base_url: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("period1", &unix_midnight(start).to_string())
            .append_pair("period2", &unix_midnight(end).to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let url = self.chart_url(symbol, start, end)?;
        debug!("Fetching chart: {}", url);

        let body = self
            .client
            .send_text(&format!("GET chart {}", symbol), |c| c.get(url.clone()))
            .await?;

        parse_chart_response(symbol, &body)
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Decode a chart payload into bars. An empty result is not an error.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<Vec<PriceBar>, FetchError> {
    let resp: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::provider(PROVIDER, format!("{}: malformed chart JSON: {}", symbol, e)))?;

    if let Some(err) = resp.chart.error {
        return Err(FetchError::provider(
            PROVIDER,
            format!("{}: {} - {}", symbol, err.code, err.description),
        ));
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let cols = ChartColumns {
        timestamps: result.timestamp.unwrap_or_default(),
        open: quote.open.unwrap_or_default(),
        high: quote.high.unwrap_or_default(),
        low: quote.low.unwrap_or_default(),
        close: quote.close.unwrap_or_default(),
        volume: quote
            .volume
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.map(|v| v.max(0.0) as u64))
            .collect(),
    };

    Ok(chart_columns_to_bars(symbol, &cols))
}
