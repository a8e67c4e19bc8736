//! Arbitrary URL byte download.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Download budget per URL.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Download a URL's raw bytes.
///
/// Returns the bytes and the response content type, when one was sent.
///
/// # Errors
///
/// Returns an error on network failure or a non-success status.
pub async fn download(url: &str) -> Result<(Vec<u8>, Option<String>)> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("Failed to build download client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("Download of {url} returned {}", response.status()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read body of {url}"))?
        .to_vec();

    debug!(url = %url, len = bytes.len(), content_type = ?content_type, "Downloaded");
    Ok((bytes, content_type))
}
