use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while acquiring or persisting a single item.
///
/// None of these abort a run: fetchers fold them into
/// [`FetchOutcome::Failed`](crate::models::FetchOutcome) and the pipeline
/// moves on to the next label.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{provider}: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FetchError {
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
