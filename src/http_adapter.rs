//! HTTP adapter encapsulating `reqwest`, grounded on `original_source`'s
//! `macro_infra/requests_adapter.py` (`RequestsAdapter`) and the teacher's
//! conditional-download idiom in `importers/b3_cotahist.rs`
//! (`If-Modified-Since` header via `httpdate`). Per spec §4.3, a streamed
//! download is staged at `dest.partial` and atomically renamed on success;
//! any error removes the partial file so callers never observe a half
//! written destination.

use crate::error::IngestError;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Headers of interest from a HEAD response, per spec §4.3.
#[derive(Debug, Clone, Default)]
pub struct HeadInfo {
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
    pub not_modified: bool,
}

pub struct HttpAdapter {
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::NetworkError(e.to_string()))?;
        Ok(Self { client })
    }

    /// `HEAD <url>` returning Content-Length and Last-Modified without a
    /// body. `if_modified_since` makes the request conditional; a `304`
    /// response is reported via `HeadInfo::not_modified` rather than as an
    /// error.
    pub async fn head(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
    ) -> Result<HeadInfo, IngestError> {
        let mut request = self.client.head(url);
        if let Some(since) = if_modified_since {
            request = request.header("If-Modified-Since", since);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(HeadInfo {
                not_modified: true,
                ..HeadInfo::default()
            });
        }

        if !response.status().is_success() {
            return Err(status_to_error(response.status().as_u16(), url));
        }

        let content_length = response.content_length();
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(HeadInfo {
            content_length,
            last_modified,
            not_modified: false,
        })
    }

    /// Stream `GET <url>` to `dest`, staging at `dest.partial` and
    /// renaming on clean completion. Any error (network, write) removes
    /// the partial file before propagating.
    pub async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64, IngestError> {
        let partial = partial_path(dest);

        let result = self.stream_to_partial(url, &partial).await;

        match result {
            Ok(bytes_written) => {
                tokio::fs::rename(&partial, dest).await?;
                tracing::debug!(url, dest = %dest.display(), bytes_written, "stream_to_file completed");
                Ok(bytes_written)
            }
            Err(err) => {
                tracing::warn!(url, dest = %dest.display(), error = %err, "stream_to_file failed, cleaning up partial");
                let _ = tokio::fs::remove_file(&partial).await;
                Err(err)
            }
        }
    }

    async fn stream_to_partial(&self, url: &str, partial: &Path) -> Result<u64, IngestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        if !response.status().is_success() {
            return Err(status_to_error(response.status().as_u16(), url));
        }

        let mut file = tokio::fs::File::create(partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| classify_reqwest_error(&e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn classify_reqwest_error(error: &reqwest::Error) -> IngestError {
    if error.is_timeout() {
        IngestError::TimeoutError(error.to_string())
    } else {
        IngestError::NetworkError(error.to_string())
    }
}

fn status_to_error(status: u16, url: &str) -> IngestError {
    if (500..600).contains(&status) {
        IngestError::NetworkError(format!("server error {} for {}", status, url))
    } else {
        IngestError::NetworkError(format!("unexpected status {} for {}", status, url))
    }
}
