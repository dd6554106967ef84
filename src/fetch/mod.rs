//! Retrieval of raw CSV text for a dataset.
//!
//! Sources starting with `http` are fetched with a single GET (no retries);
//! anything else is read from the local filesystem.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

/// Upper bound on a single fetch, connection and body included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(StatusCode),

    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("reading local file failed")]
    Local(#[source] std::io::Error),
}

/// Issues a GET for `url` and returns the decoded body.
///
/// # Errors
///
/// Returns [`FetchError::Status`] for any non-2xx response and
/// [`FetchError::Transport`] for connection failures and timeouts.
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String, FetchError> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await.map_err(FetchError::Transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = resp.text().await.map_err(FetchError::Transport)?;
    debug!(url, bytes = body.len(), "Fetched CSV body");
    Ok(body)
}

/// Loads CSV text from a URL or a local file path.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<String, FetchError> {
    if source.starts_with("http") {
        fetch_text(client, source).await
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(FetchError::Local)
    }
}
