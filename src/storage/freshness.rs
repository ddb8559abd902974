//! Last-fetch timestamps per label, persisted as one flat JSON object.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::replace_file;
use crate::error::FetchError;
use crate::utils::now_unix;

pub const TIMESTAMP_FILE: &str = "timestamps.json";

pub type FreshnessRecords = BTreeMap<String, f64>;

pub struct FreshnessStore {
    path: PathBuf,
    ttl: Duration,
    // serialises read-modify-write of the document
    write_lock: Mutex<()>,
}

impl FreshnessStore {
    pub fn new(output_dir: &Path, ttl: Duration) -> Self {
        Self {
            path: output_dir.join(TIMESTAMP_FILE),
            ttl,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self, label: &str) -> bool {
        self.is_fresh_at(label, now_unix())
    }

    /// True iff `label` was fetched less than `ttl` before `now`.
    pub fn is_fresh_at(&self, label: &str, now: f64) -> bool {
        match self.load().get(label) {
            Some(&ts) => now - ts < self.ttl.as_secs_f64(),
            None => false,
        }
    }

    /// Record a completed fetch, rewriting the whole document.
    pub fn mark_fresh(&self, label: &str, now: f64) -> Result<(), FetchError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut records = self.load();
        records.insert(label.to_string(), now);

        replace_file(&self.path, |w| {
            serde_json::to_writer(&mut *w, &records).map_err(std::io::Error::from)
        })?;

        debug!("Timestamp updated for {}", label);
        Ok(())
    }

    pub fn last_fetched(&self, label: &str) -> Option<DateTime<Utc>> {
        self.load().get(label).and_then(|&ts| to_datetime(ts))
    }

    /// All records currently on disk.
    pub fn snapshot(&self) -> FreshnessRecords {
        self.load()
    }

    /// Missing or unreadable documents read as empty.
    fn load(&self) -> FreshnessRecords {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return FreshnessRecords::new(),
            Err(e) => {
                warn!("Cannot read {:?}: {} (treating as empty)", self.path, e);
                return FreshnessRecords::new();
            }
        };

        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Malformed {:?}: {} (treating as empty)", self.path, e);
            FreshnessRecords::new()
        })
    }
}

pub fn to_datetime(ts: f64) -> Option<DateTime<Utc>> {
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}
