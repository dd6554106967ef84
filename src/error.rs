//! Error types for the ETL pipeline.
//!
//! Every fatal condition ends up as an [`EtlError`]. Data-quality problems in
//! the CSV input are never errors; they are counted in
//! [`SeriesQuality`](crate::stats::SeriesQuality) instead.

use std::path::PathBuf;

use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("loading catalog {} failed: {reason}", .path.display())]
    Catalog { path: PathBuf, reason: String },

    #[error("fetching dataset {short_name} from {url} failed")]
    Fetch {
        short_name: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("initializing HTTP client failed")]
    HttpClient(#[source] reqwest::Error),

    #[error("writing {} failed", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing output failed")]
    Json(#[from] serde_json::Error),

    #[error("writing quality report failed")]
    Csv(#[from] csv::Error),

    #[error("dataset worker did not complete")]
    Worker(#[from] tokio::task::JoinError),
}

impl EtlError {
    pub(crate) fn catalog(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        EtlError::Catalog {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
