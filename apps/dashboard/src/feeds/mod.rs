//! Feed source — the single point of entry for every remote read the dashboard makes.
//!
//! The dataset CSV, the country directory and the live time series are all
//! pulled through `FeedSource`, so the data pipeline can run against an
//! in-memory source in tests and against `HttpFeedSource` in production.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Which upstream feed a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Dataset,
    CountryDirectory,
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Feed::Dataset => "dataset",
            Feed::CountryDirectory => "country directory",
        })
    }
}

/// A feed that could not be fetched or parsed. Fatal to whatever widget depends on it.
#[derive(Debug, Error)]
#[error("{feed} unavailable: {source}")]
pub struct DataUnavailable {
    pub feed: Feed,
    #[source]
    pub source: FeedError,
}

impl DataUnavailable {
    pub fn new(feed: Feed, source: impl Into<FeedError>) -> Self {
        Self {
            feed,
            source: source.into(),
        }
    }
}

/// Anything that can hand back the raw body behind a URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FeedError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HttpFeedSource — reqwest with bounded retry
// ────────────────────────────────────────────────────────────────────────────

const BASE_BACKOFF: Duration = Duration::from_millis(500);

// Backoff stops doubling after this many retries (500ms * 2^5 = 16s).
const MAX_BACKOFF_EXPONENT: u32 = 5;

#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_retries: max_retries.max(1),
            backoff: BASE_BACKOFF,
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Delay before retry number `attempt` (1-based): `base`, `2 * base`, `4 * base`, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(1 << exponent)
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    /// GETs `url`, retrying transport errors, 429 and 5xx with exponential backoff.
    async fn fetch(&self, url: &str) -> Result<Bytes, FeedError> {
        let mut last_error: Option<FeedError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.backoff, attempt);
                warn!(
                    "Fetch of {url} failed (attempt {attempt}), retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FeedError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(FeedError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
                continue;
            }

            if !status.is_success() {
                return Err(FeedError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.bytes().await?;
            debug!("Fetched {} bytes from {url}", body.len());
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| FeedError::Malformed(format!("no attempt made for {url}"))))
    }
}
