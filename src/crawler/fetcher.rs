//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building one HTTP client per run with a browser-like header set
//! - GET requests with total and connect timeouts
//! - Retry with exponential backoff for failed attempts
//! - Error classification
//!
//! The fetcher owns no concurrency policy; callers wrap it in a
//! [`ConcurrencyGate`](crate::crawler::ConcurrencyGate).

use crate::config::FetchConfig;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// User agent of a desktop browser; the origin rejects obvious bots
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Errors from a single fetch attempt, or from the whole retry loop
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("Failed to fetch {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}

impl FetchError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Network(format!("Connection failed: {}", error))
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Attempt budget and backoff schedule
///
/// The delay after zero-indexed attempt `i` is `base * 2^i`; no delay follows
/// the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base())
    }

    /// Delay to wait after the given zero-indexed attempt fails
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }

    /// Every delay a URL that never succeeds will sleep through
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.saturating_sub(1)).map(|attempt| self.delay_for(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// The browser-identifying header set sent with every request
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use biturbo_harvester::config::FetchConfig;
/// use biturbo_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(browser_headers())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()
}

/// Issues GET requests with retry and exponential backoff
///
/// One fetcher (and so one connection pool) lives for the duration of a run
/// and is shared by every task; cloning is cheap.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches a URL, retrying failed attempts
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx with readable body | Return page |
    /// | Any other status | Retry |
    /// | Timeout / connect error | Retry |
    /// | Body read or decode error | Retry |
    ///
    /// After `max_attempts` failed attempts the last error is wrapped in
    /// [`FetchError::Exhausted`]; nothing else is returned as an error.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut last_error = None;

        for attempt in 0..self.retry.max_attempts {
            match self.attempt(url).await {
                Ok(mut page) => {
                    page.attempts = attempt + 1;
                    return Ok(page);
                }
                Err(e) => {
                    tracing::warn!("Attempt {} failed for {}: {}", attempt + 1, url, e);
                    last_error = Some(e);

                    if attempt + 1 < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        tracing::error!(
            "Failed to fetch {} after {} attempts",
            url,
            self.retry.max_attempts
        );

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.retry.max_attempts,
            last,
        })
    }

    async fn attempt(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        if response.url().as_str() != url {
            tracing::debug!("{} redirected to {}", url, response.url());
        }
        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        Ok(FetchedPage {
            status_code: status.as_u16(),
            body,
            attempts: 1,
        })
    }
}
