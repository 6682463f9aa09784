//! Fetch with retry
//!
//! This module wraps a [`Transport`] with the crawler's retry policy:
//! - Each attempt gets its own timeout; a timed-out attempt counts toward
//!   the retry budget like a connection reset
//! - Only transient failures are retried
//! - Attempt k (k >= 2) is preceded by a backoff of `base * 2^(k-2)`
//! - A cancellation token aborts both in-flight attempts and backoff sleeps
//!
//! A failure here is always local to one URL. The caller treats the URL as a
//! dead end and keeps crawling.

use crate::config::CrawlerConfig;
use crate::crawler::transport::{Transport, TransportError};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Retry and timeout settings for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, first attempt included
    pub max_attempts: u32,

    /// Backoff unit
    pub base_delay: Duration,

    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            attempt_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }

    /// Delay before the given 1-based attempt number
    ///
    /// | Attempt | Delay |
    /// |---------|-------|
    /// | 1 | none |
    /// | 2 | 1 x base |
    /// | 3 | 2 x base |
    /// | 4 | 4 x base |
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// A page that was fetched successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,

    /// The URL the body was served from, after redirects
    pub final_url: Url,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body
    pub body: String,

    /// Number of attempts used, including the successful one
    pub attempts: u32,
}

/// Why a fetch was abandoned
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailureReason {
    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: TransportError },

    #[error("{0}")]
    Permanent(TransportError),

    #[error("not an HTML page ({0})")]
    NotHtml(String),

    #[error("cancelled")]
    Cancelled,
}

/// A page-level fetch failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch {url}: {reason}")]
pub struct FetchFailure {
    pub url: String,
    pub reason: FailureReason,
    pub attempts: u32,
}

impl FetchFailure {
    fn new(url: &Url, reason: FailureReason, attempts: u32) -> Self {
        Self {
            url: url.to_string(),
            reason,
            attempts,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason == FailureReason::Cancelled
    }
}

/// Fetches a URL, retrying transient failures with exponential backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Connection reset | Retry with backoff |
/// | Attempt timeout | Retry with backoff |
/// | HTTP 4xx / 5xx | Immediate -> Permanent |
/// | DNS failure | Immediate -> Permanent |
/// | Malformed response | Immediate -> Permanent |
/// | Non-HTML Content-Type | Immediate -> NotHtml |
/// | Cancellation | Immediate -> Cancelled |
///
/// No lock is held while waiting; the backoff only delays this call.
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    url: &Url,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<FetchedPage, FetchFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            let delay = policy.backoff_delay(attempt);
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(FetchFailure::new(url, FailureReason::Cancelled, attempt - 1));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(FetchFailure::new(url, FailureReason::Cancelled, attempt - 1));
            }
            result = tokio::time::timeout(
                policy.attempt_timeout,
                transport.fetch(url, policy.attempt_timeout),
            ) => result,
        };

        let error = match outcome {
            Ok(Ok(response)) => {
                if let Some(content_type) = &response.content_type {
                    if !is_html(content_type) {
                        return Err(FetchFailure::new(
                            url,
                            FailureReason::NotHtml(content_type.clone()),
                            attempt,
                        ));
                    }
                }

                return Ok(FetchedPage {
                    url: url.clone(),
                    final_url: response.final_url,
                    content_type: response.content_type,
                    body: response.body,
                    attempts: attempt,
                });
            }
            Ok(Err(error)) => error,
            Err(_elapsed) => TransportError::Timeout,
        };

        if !error.is_transient() {
            tracing::debug!("Permanent failure for {}: {}", url, error);
            return Err(FetchFailure::new(url, FailureReason::Permanent(error), attempt));
        }

        if attempt >= max_attempts {
            tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
            return Err(FetchFailure::new(
                url,
                FailureReason::RetriesExhausted {
                    attempts: attempt,
                    last: error,
                },
                attempt,
            ));
        }

        tracing::warn!(
            "Transient error on {}: {}, retrying (attempt {}/{})",
            url,
            error,
            attempt + 1,
            max_attempts
        );
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}
