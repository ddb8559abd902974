use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::providers::cleaner::normalise_symbol;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
}

/// Market data provider (Yahoo chart API)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    #[serde(default = "default_market_base_url")]
    pub base_url: String,

    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub http: HttpConfig,
}

/// News provider (Event Registry)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Transport knobs shared by both providers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// What to fetch and for how far back
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Sector name → ETF proxy symbol
    #[serde(default = "default_sector_proxies")]
    pub sector_proxies: BTreeMap<String, String>,

    /// Sector name → member stocks. Informational only.
    #[serde(default = "default_sector_members")]
    pub sector_members: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    #[serde(default = "default_max_news_items")]
    pub max_news_items: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_market_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}
fn default_news_base_url() -> String {
    "https://eventregistry.org".to_string()
}
fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_user_agent() -> String {
    "stock-ingest/0.1 (market data and headline collector)".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    500
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_max_retries() -> u32 {
    3
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("stock_data")
}
fn default_lookback_years() -> u32 {
    11
}
fn default_cache_ttl_hours() -> u64 {
    24
}
fn default_max_news_items() -> usize {
    100
}

const SECTORS: [(&str, &str, [&str; 5]); 4] = [
    ("Technology", "XLK", ["AAPL", "MSFT", "NVDA", "ADBE", "INTC"]),
    ("Healthcare", "XLV", ["JNJ", "PFE", "ABBV", "MRK", "TMO"]),
    ("Finance", "XLF", ["JPM", "CME", "WFC", "CPAY", "GS"]),
    ("Energy", "XLE", ["XOM", "CVX", "PBR", "BP", "PSX"]),
];

fn default_symbols() -> Vec<String> {
    SECTORS
        .iter()
        .flat_map(|(_, _, members)| members.iter().map(|s| s.to_string()))
        .collect()
}
fn default_sector_proxies() -> BTreeMap<String, String> {
    SECTORS
        .iter()
        .map(|(sector, etf, _)| (sector.to_string(), etf.to_string()))
        .collect()
}
fn default_sector_members() -> BTreeMap<String, Vec<String>> {
    SECTORS
        .iter()
        .map(|(sector, _, members)| {
            (sector.to_string(), members.iter().map(|s| s.to_string()).collect())
        })
        .collect()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_base_url(),
            user_agent: default_browser_user_agent(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_base_url(),
            api_key: None,
            user_agent: default_user_agent(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            sector_proxies: default_sector_proxies(),
            sector_members: default_sector_members(),
            lookback_years: default_lookback_years(),
            cache_ttl_hours: default_cache_ttl_hours(),
            max_news_items: default_max_news_items(),
        }
    }
}

// ── Universe accessors ───────────────────────────────────────────────────────

impl UniverseConfig {
    /// Configured stock symbols, normalised, first occurrence kept.
    pub fn stock_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.symbols.len());
        for s in self.symbols.iter().map(|s| normalise_symbol(s)) {
            if !s.is_empty() && !out.contains(&s) {
                out.push(s);
            }
        }
        out
    }

    /// `(sector name, proxy symbol)` pairs in sector-name order.
    pub fn sector_pairs(&self) -> Vec<(String, String)> {
        self.sector_proxies
            .iter()
            .map(|(sector, etf)| (sector.clone(), normalise_symbol(etf)))
            .filter(|(_, etf)| !etf.is_empty())
            .collect()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("INGEST").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_universe() {
        let u = UniverseConfig::default();
        assert_eq!(u.stock_symbols().len(), 20);
        assert_eq!(u.sector_pairs().len(), 4);
        assert_eq!(u.sector_pairs()[0], ("Energy".to_string(), "XLE".to_string()));
        assert_eq!(u.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(u.lookback_years, 11);
        assert_eq!(u.max_news_items, 100);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let u = UniverseConfig {
            cache_ttl_hours: u64::MAX,
            ..UniverseConfig::default()
        };
        assert_eq!(u.cache_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_stock_symbols_normalised_and_deduped() {
        let u = UniverseConfig {
            symbols: vec![" aapl".into(), "AAPL".into(), "".into(), "msft ".into()],
            ..UniverseConfig::default()
        };
        assert_eq!(u.stock_symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[storage]\noutput_dir = \"out\"\n[universe]\nsymbols = [\"IBM\"]\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.storage.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.universe.stock_symbols(), vec!["IBM"]);
        assert_eq!(cfg.universe.sector_pairs().len(), 4);
        assert_eq!(cfg.news.base_url, "https://eventregistry.org");
        assert!(cfg.news.api_key.is_none());
    }
}
