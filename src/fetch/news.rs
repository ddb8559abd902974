use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{FetchOutcome, LabelType, NewsBatch};
use crate::providers::NewsSource;
use crate::providers::cleaner::clean_headlines;
use crate::storage::{ArtifactStore, FreshnessStore};
use crate::utils::now_unix;

/// Fetches English headlines for a label unless the label is still fresh.
pub struct NewsFetcher {
    source: Arc<dyn NewsSource>,
    freshness: Arc<FreshnessStore>,
    store: Arc<ArtifactStore>,
    max_items: usize,
}

impl NewsFetcher {
    pub fn new(
        source: Arc<dyn NewsSource>,
        freshness: Arc<FreshnessStore>,
        store: Arc<ArtifactStore>,
        max_items: usize,
    ) -> Self {
        Self {
            source,
            freshness,
            store,
            max_items,
        }
    }

    pub async fn fetch(&self, label: &str, label_type: LabelType) -> FetchOutcome<NewsBatch> {
        self.fetch_at(label, label_type, now_unix()).await
    }

    /// 1. fresh → `CacheHit`, no request, file untouched
    /// 2. search, keep English titles
    /// 3. write non-empty batches, then stamp the label
    pub async fn fetch_at(&self, label: &str, label_type: LabelType, now: f64) -> FetchOutcome<NewsBatch> {
        if self.freshness.is_fresh_at(label, now) {
            info!("Using cached news data for {}", label);
            return FetchOutcome::CacheHit;
        }

        let articles = match self.source.search_articles(label, self.max_items, true).await {
            Ok(a) => a,
            Err(e) => {
                warn!("Error fetching news for {}: {}", label, e);
                return FetchOutcome::Failed(e);
            }
        };

        let batch = NewsBatch {
            label: label.to_string(),
            label_type,
            headlines: clean_headlines(&articles, self.max_items),
        };
        debug!(
            "{}: {} articles, {} English headlines kept",
            label,
            articles.len(),
            batch.len()
        );

        if batch.is_empty() {
            info!("No headlines to save for {}", label);
        } else {
            match self.store.write_headlines(&batch) {
                Ok(path) => debug!("News for {} saved to {:?}", label, path),
                Err(e) => {
                    warn!("Error saving news for {}: {}", label, e);
                    return FetchOutcome::Failed(e);
                }
            }
        }

        if let Err(e) = self.freshness.mark_fresh(label, now) {
            warn!("Error updating timestamp for {}: {}", label, e);
            return FetchOutcome::Failed(e);
        }

        FetchOutcome::Fetched(batch)
    }
}
