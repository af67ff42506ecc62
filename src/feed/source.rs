use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::types::{build_items, Category, FeedKind, FeedRecord, MediaItem, ProfileRecord};

const MAX_RETRIES: u32 = 3;
const MAX_LISTING_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_PROFILE_SIZE: usize = 256 * 1024;

/// Errors that can occur while talking to the remote feed service.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Body was not the expected JSON shape
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Response too large")]
    ResponseTooLarge,
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true if the request may succeed when repeated.
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Network(_) => true,
            FetchError::HttpStatus(status) => *status >= 500,
            FetchError::Decode(_) | FetchError::ResponseTooLarge | FetchError::InvalidUrl(_) => {
                false
            }
        }
    }
}

/// The remote collaborator that supplies listings and author profiles.
///
/// Implementations must be cheap to clone; the controller hands a clone to
/// every spawned fetch task.
pub trait RemoteApi: Clone + Send + Sync + 'static {
    /// Ordered items for one category of one feed.
    fn fetch_feed(
        &self,
        kind: FeedKind,
        category: Category,
    ) -> impl Future<Output = Result<Vec<MediaItem>, FetchError>> + Send;

    /// Profile of one author. Not retried by callers.
    fn fetch_profile(
        &self,
        author_id: &str,
    ) -> impl Future<Output = Result<ProfileRecord, FetchError>> + Send;
}

/// HTTP implementation of [`RemoteApi`].
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retry_base: Duration,
}

impl HttpApi {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        // Url::join drops the last path segment unless it ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(FetchError::InvalidUrl(format!(
                    "unsupported scheme {scheme} (only http/https allowed)"
                )))
            }
        }
        Ok(Self {
            client,
            base_url,
            timeout,
            retry_base: Duration::from_secs(1),
        })
    }

    /// Override the first backoff delay (doubles on each retry).
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_bytes(&self, url: &Url, limit: usize) -> Result<Vec<u8>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url.as_str()).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, limit).await
    }
}

impl RemoteApi for HttpApi {
    async fn fetch_feed(
        &self,
        kind: FeedKind,
        category: Category,
    ) -> Result<Vec<MediaItem>, FetchError> {
        let url = self.endpoint(kind.endpoint(), &[("category", category.as_str())])?;
        let mut retry_count = 0;

        let bytes = loop {
            match self.get_bytes(&url, MAX_LISTING_SIZE).await {
                Ok(bytes) => break bytes,
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay = self.retry_base * 2u32.pow(retry_count);
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Feed request failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let records: Vec<FeedRecord> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        let result = build_items(records, kind, category);

        if result.skipped > 0 {
            tracing::warn!(
                kind = %kind,
                category = %category,
                skipped = result.skipped,
                "Records without a media URL skipped"
            );
        }
        tracing::debug!(kind = %kind, category = %category, count = result.items.len(), "Feed fetched");

        Ok(result.items)
    }

    async fn fetch_profile(&self, author_id: &str) -> Result<ProfileRecord, FetchError> {
        let url = self.endpoint("profileget", &[("userId", author_id)])?;
        let bytes = self.get_bytes(&url, MAX_PROFILE_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
