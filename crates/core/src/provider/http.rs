//! Shared HTTP plumbing for remote provider adapters.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use tokio::io::AsyncWriteExt;

use super::types::ProviderError;

/// Timeout applied to individual submit/poll/cancel requests. Generation
/// itself is bounded separately by the tracker deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout for all provider clients.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client shared by a provider adapter instance.
pub(super) fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::unavailable(format!("failed to build HTTP client: {}", e)))
}

/// Maps a reqwest transport error onto the provider taxonomy. Transport
/// failures are always transient from the caller's point of view.
pub(super) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::unavailable(format!("request timed out: {}", e))
    } else if e.is_connect() {
        ProviderError::unavailable(format!("connection failed: {}", e))
    } else {
        ProviderError::unavailable(e.to_string())
    }
}

/// Classifies a non-success HTTP status into Rejected vs Unavailable.
///
/// 429 and 5xx are transient (the service exists but cannot serve us right
/// now); everything else in the 4xx range means the request itself was
/// refused.
pub(super) fn classify_status(status: u16, body: &str) -> ProviderError {
    let summary: String = body.chars().take(200).collect();
    match status {
        429 | 500..=599 => {
            ProviderError::unavailable(format!("HTTP {}: {}", status, summary))
        }
        _ => ProviderError::rejected(format!("HTTP {}: {}", status, summary)),
    }
}

/// Streams an HTTP response body to disk without buffering the whole file.
pub(super) async fn download_to_file(
    request: RequestBuilder,
    dest: &Path,
) -> Result<(), ProviderError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = request.send().await.map_err(transport_error)?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &body));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport_error)?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}
