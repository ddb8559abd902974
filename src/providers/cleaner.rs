use crate::models::{Article, PriceBar};
use chrono::{DateTime, NaiveDate};
use std::collections::HashSet;
use tracing::warn;

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Parse price: strip everything except digits, dot, minus.
/// "$1,234.56" → 1234.56 | "610.00" → 610.0
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

/// Parse volume, tolerating thousands separators and a trailing ".0".
pub fn parse_volume(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', "");
    if s.is_empty() || s == "N/A" || s == "-" {
        return None;
    }
    s.parse::<u64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// Parse dates: ISO first, then the common US/EU slash forms.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // pandas writes a time component on datetime indexes
    let s = s.split_whitespace().next().unwrap_or(s);

    ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%b %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

// ── Chart columns → PriceBar ──────────────────────────────────────────────────

/// Column-oriented OHLCV as the chart API returns it.
#[derive(Debug, Default)]
pub struct ChartColumns {
    pub timestamps: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<u64>>,
}

/// Zip columns into bars. Rows without a close are dropped; other gaps
/// fall back to the close (prices) or zero (volume).
pub fn chart_columns_to_bars(symbol: &str, cols: &ChartColumns) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(cols.timestamps.len());
    let mut dropped = 0usize;

    for (i, &ts) in cols.timestamps.iter().enumerate() {
        let Some(close) = cols.close.get(i).copied().flatten() else {
            dropped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            dropped += 1;
            continue;
        };
        let pick = |col: &[Option<f64>]| col.get(i).copied().flatten().unwrap_or(close);

        bars.push(PriceBar {
            date,
            open: pick(&cols.open),
            high: pick(&cols.high),
            low: pick(&cols.low),
            close,
            volume: cols.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if dropped > 0 {
        warn!("{}: dropped {} rows without a close", symbol, dropped);
    }
    bars
}

// ── Articles → headlines ──────────────────────────────────────────────────────

/// English titles only, trimmed, de-duplicated, provider order kept, capped.
pub fn clean_headlines(articles: &[Article], max_items: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .filter(|a| a.is_english())
        .map(|a| a.title.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .take(max_items)
        .map(str::to_string)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, lang: &str) -> Article {
        Article {
            title: title.to_string(),
            lang: lang.to_string(),
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,234.56"), Some(1234.56));
        assert_eq!(parse_price(" 610.00 "), Some(610.0));
        assert_eq!(parse_price("N/A"), None);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume("12,345"), Some(12345));
        assert_eq!(parse_volume("100.0"), Some(100));
        assert_eq!(parse_volume("-"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(parse_date("2024-02-20"), Some(d));
        assert_eq!(parse_date("2024-02-20 00:00:00"), Some(d));
        assert_eq!(parse_date("02/20/2024"), Some(d));
        assert_eq!(parse_date("garbage"), None);
    }

    #[test]
    fn test_chart_columns_fill_gaps_and_drop_missing_close() {
        let cols = ChartColumns {
            // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
            timestamps: vec![1_704_205_800, 1_704_292_200, 1_704_378_600],
            open: vec![Some(1.0), None, Some(3.0)],
            high: vec![Some(1.5), Some(2.5), Some(3.5)],
            low: vec![Some(0.5), Some(1.5), Some(2.5)],
            close: vec![Some(1.2), Some(2.2), None],
            volume: vec![Some(10), None, Some(30)],
        };
        let bars = chart_columns_to_bars("AAPL", &cols);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date.to_string(), "2024-01-02");
        assert_eq!(bars[1].open, 2.2);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn test_clean_headlines_english_only() {
        let articles = vec![
            article("Apple beats estimates", "eng"),
            article("Apple übertrifft Erwartungen", "deu"),
            article("  Apple unveils new chip ", "eng"),
        ];
        assert_eq!(
            clean_headlines(&articles, 100),
            vec!["Apple beats estimates", "Apple unveils new chip"]
        );
    }

    #[test]
    fn test_clean_headlines_dedup_and_cap() {
        let articles = vec![
            article("A", "eng"),
            article("A", "eng"),
            article("", "eng"),
            article("B", "eng"),
            article("C", "eng"),
        ];
        assert_eq!(clean_headlines(&articles, 2), vec!["A", "B"]);
    }
}
