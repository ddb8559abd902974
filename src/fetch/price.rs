use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{DateWindow, FetchOutcome, LabelType, PriceSeries};
use crate::providers::MarketDataSource;
use crate::storage::ArtifactStore;

/// Downloads a symbol's daily history and replaces its CSV. No cache gate.
pub struct PriceFetcher {
    source: Arc<dyn MarketDataSource>,
    store: Arc<ArtifactStore>,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, store: Arc<ArtifactStore>) -> Self {
        Self { source, store }
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        label_type: LabelType,
        window: DateWindow,
    ) -> FetchOutcome<PriceSeries> {
        debug!("{}: fetching prices {}", symbol, window);

        let bars = match self.source.fetch_ohlcv(symbol, window.start, window.end).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!("Error fetching data for {}: {}", symbol, e);
                return FetchOutcome::Failed(e);
            }
        };

        let series = PriceSeries::new(symbol, label_type, bars);
        if series.is_empty() {
            warn!("{}: provider returned no rows, writing header only", symbol);
        }

        match self.store.write_price_series(&series) {
            Ok(path) => {
                debug!("Data for {} saved to {:?}", symbol, path);
                FetchOutcome::Fetched(series)
            }
            Err(e) => {
                warn!("Error saving data for {}: {}", symbol, e);
                FetchOutcome::Failed(e)
            }
        }
    }
}
