//! CSV artifacts in the output directory: one price file per symbol, one
//! headline file per news label.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::replace_file;
use crate::error::FetchError;
use crate::models::{LabelType, NewsBatch, PriceBar, PriceSeries};
use crate::providers::cleaner::{parse_date, parse_price, parse_volume};

const PRICE_SUFFIX: &str = "_data.csv";
const NEWS_SUFFIX: &str = "_news.csv";

#[derive(Debug, Serialize, Deserialize)]
struct HeadlineRow {
    headline: String,
}

/// Counts of artifacts found on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArtifactInventory {
    pub price_files: Vec<PathBuf>,
    pub news_files: Vec<PathBuf>,
}

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn price_path(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}{}", symbol, PRICE_SUFFIX))
    }

    pub fn news_path(&self, label: &str, label_type: LabelType) -> PathBuf {
        self.root.join(format!("{}_{}{}", label_type, label, NEWS_SUFFIX))
    }

    // ── Writers ───────────────────────────────────────────────────────────────

    /// Replace `{symbol}_data.csv`. An empty series yields a header-only file.
    pub fn write_price_series(&self, series: &PriceSeries) -> Result<PathBuf, FetchError> {
        let path = self.price_path(&series.symbol);

        replace_file(&path, |w| {
            let mut wtr = csv::Writer::from_writer(w);
            wtr.write_record([
                "Date",
                "Open",
                "High",
                "Low",
                "Close",
                "Volume",
                series.label_type.tag_column(),
            ])?;
            for bar in &series.bars {
                wtr.write_record([
                    bar.date.to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                    series.symbol.clone(),
                ])?;
            }
            wtr.flush()
        })?;

        debug!("{}: {} rows → {:?}", series.symbol, series.len(), path);
        Ok(path)
    }

    /// Replace `{label_type}_{label}_news.csv` with a single `headline` column.
    pub fn write_headlines(&self, batch: &NewsBatch) -> Result<PathBuf, FetchError> {
        let path = self.news_path(&batch.label, batch.label_type);

        replace_file(&path, |w| {
            let mut wtr = csv::Writer::from_writer(w);
            for headline in &batch.headlines {
                wtr.serialize(HeadlineRow {
                    headline: headline.clone(),
                })?;
            }
            wtr.flush()
        })?;

        debug!("{}: {} headlines → {:?}", batch.label, batch.len(), path);
        Ok(path)
    }

    // ── Readers ───────────────────────────────────────────────────────────────

    /// Read back a price file. `Ok(None)` when it does not exist; bad rows
    /// are skipped with a warning.
    pub fn read_price_series(
        &self,
        symbol: &str,
        label_type: LabelType,
    ) -> Result<Option<PriceSeries>, FetchError> {
        let path = self.price_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| FetchError::csv(&path, e))?;

        let mut bars = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("Row {} in {:?}: {}", i + 1, path, e);
                    continue;
                }
            };

            let field = |n: usize| record.get(n).unwrap_or_default();
            let parsed = (|| {
                Some(PriceBar {
                    date: parse_date(field(0))?,
                    open: parse_price(field(1))?,
                    high: parse_price(field(2))?,
                    low: parse_price(field(3))?,
                    close: parse_price(field(4))?,
                    volume: parse_volume(field(5)).unwrap_or(0),
                })
            })();

            match parsed {
                Some(bar) => bars.push(bar),
                None => warn!("Row {} in {:?}: unparseable, skipped", i + 1, path),
            }
        }

        Ok(Some(PriceSeries::new(symbol, label_type, bars)))
    }

    /// Read back a headline file. `Ok(None)` when it does not exist.
    pub fn read_headlines(
        &self,
        label: &str,
        label_type: LabelType,
    ) -> Result<Option<Vec<String>>, FetchError> {
        let path = self.news_path(label, label_type);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| FetchError::csv(&path, e))?;
        let headlines = reader
            .deserialize::<HeadlineRow>()
            .map(|r| r.map(|row| row.headline))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::csv(&path, e))?;

        Ok(Some(headlines))
    }

    /// List price and news artifacts currently in the output directory.
    pub fn discover_artifacts(&self) -> Result<ArtifactInventory, FetchError> {
        let mut inventory = ArtifactInventory::default();
        if !self.root.exists() {
            return Ok(inventory);
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| FetchError::persistence(&self.root, e))?;
        for entry in entries {
            let path = entry.map_err(|e| FetchError::persistence(&self.root, e))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            if name.ends_with(PRICE_SUFFIX) {
                inventory.price_files.push(path);
            } else if name.ends_with(NEWS_SUFFIX) {
                inventory.news_files.push(path);
            }
        }

        inventory.price_files.sort();
        inventory.news_files.sort();
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: date.parse().unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_paths() {
        let store = ArtifactStore::new("out");
        assert_eq!(store.price_path("AAPL"), PathBuf::from("out/AAPL_data.csv"));
        assert_eq!(
            store.news_path("XLK", LabelType::Sector),
            PathBuf::from("out/sector_XLK_news.csv")
        );
    }

    #[test]
    fn test_price_csv_layout() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let series = PriceSeries::new(
            "XLK",
            LabelType::Sector,
            vec![bar("2024-01-02", 200.5), bar("2024-01-03", 201.0)],
        );

        let path = store.write_price_series(&series).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Date,Open,High,Low,Close,Volume,ETF");
        assert_eq!(lines[1], "2024-01-02,199.5,201.5,198.5,200.5,1000,XLK");
        assert_eq!(lines.len(), 3);

        let back = store.read_price_series("XLK", LabelType::Sector).unwrap().unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_empty_series_is_header_only() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store
            .write_price_series(&PriceSeries::new("TOT", LabelType::Stock, vec![]))
            .unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_end(), "Date,Open,High,Low,Close,Volume,Ticker");
    }

    #[test]
    fn test_headlines_with_commas_and_quotes() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let batch = NewsBatch {
            label: "AAPL".into(),
            label_type: LabelType::Stock,
            headlines: vec!["Apple, Inc. \"beats\"".into(), "Plain".into()],
        };

        store.write_headlines(&batch).unwrap();
        let back = store.read_headlines("AAPL", LabelType::Stock).unwrap().unwrap();
        assert_eq!(back, batch.headlines);

        let raw = std::fs::read_to_string(dir.path().join("stock_AAPL_news.csv")).unwrap();
        assert_eq!(raw.lines().next(), Some("headline"));
    }

    #[test]
    fn test_missing_artifacts_read_as_none() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("absent"));
        assert!(store.read_price_series("AAPL", LabelType::Stock).unwrap().is_none());
        assert!(store.read_headlines("AAPL", LabelType::Stock).unwrap().is_none());
        assert_eq!(store.discover_artifacts().unwrap(), ArtifactInventory::default());
    }

    #[test]
    fn test_discover_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store
            .write_price_series(&PriceSeries::new("AAPL", LabelType::Stock, vec![]))
            .unwrap();
        store
            .write_headlines(&NewsBatch {
                label: "XLK".into(),
                label_type: LabelType::Sector,
                headlines: vec!["x".into()],
            })
            .unwrap();
        std::fs::write(dir.path().join("timestamps.json"), "{}").unwrap();

        let inv = store.discover_artifacts().unwrap();
        assert_eq!(inv.price_files.len(), 1);
        assert_eq!(inv.news_files.len(), 1);
    }
}
