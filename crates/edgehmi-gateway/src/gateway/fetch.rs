//! Discovery of upstream table service OpenAPI documents.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::types::UpstreamDocument;

/// Conventional path every table service serves its own document at.
pub const DISCOVERY_PATH: &str = "/openapi.json";

/// Why a service's document could not be collected.
///
/// The reason is retained for logging; the aggregation treats every variant
/// the same way, as an empty contribution.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("discovery request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Fetches and parses one service's OpenAPI document.
///
/// Every failure mode maps to a [`FetchError`]; nothing is raised past the
/// caller, and no retry is performed. The next aggregation request fetches
/// fresh.
pub async fn fetch_openapi(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<UpstreamDocument, FetchError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), DISCOVERY_PATH);
    debug!(url = %url, "fetching upstream OpenAPI document");

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    response.json::<UpstreamDocument>().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    })
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}
