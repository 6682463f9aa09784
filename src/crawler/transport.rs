//! HTTP transport
//!
//! The crawler talks to the network through the [`Transport`] trait so the
//! traversal and retry logic can be exercised against scripted transports.
//! [`HttpTransport`] is the production implementation on top of `reqwest`.
//!
//! Every transport must sort its failures into transient errors (worth
//! retrying) and permanent ones (not worth retrying).

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successful HTTP exchange
#[derive(Debug, Clone)]
pub struct Response {
    /// URL the body was served from, after redirects
    pub final_url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: String,
}

/// Transport-level failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true for the connection-reset class of errors
    ///
    /// Timeouts and resets are transient. HTTP error statuses, DNS failures,
    /// malformed responses and anything else are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionReset(_) | Self::Timeout)
    }
}

/// Fetch-with-timeout primitive used by the crawler
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single GET request
    ///
    /// Implementations must not retry; retry policy lives in the fetcher.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Response, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wraps an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a transport with the configured identification headers
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request carries the configured User-Agent and Accept-Language
/// headers. Redirects are followed (up to 10 hops).
///
/// # Example
///
/// ```no_run
/// use catalog_scout::config::UserAgentConfig;
/// use catalog_scout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CatalogScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     accept_language: "en-US,en;q=0.9".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Response, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(Response {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Maps a `reqwest` error onto the transient/permanent taxonomy
fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }

    if let Some(status) = error.status() {
        return TransportError::HttpStatus(status.as_u16());
    }

    if is_connection_reset(&error) {
        return TransportError::ConnectionReset(error.to_string());
    }

    let chain = error_chain(&error);

    if error.is_connect() && is_dns_failure(&chain) {
        return TransportError::Dns(chain);
    }

    if error.is_decode() || error.is_body() {
        return TransportError::Malformed(chain);
    }

    TransportError::Other(chain)
}

/// Walks the source chain looking for a reset/aborted/broken-pipe IO error
fn is_connection_reset(error: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);

    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }

        let message = err.to_string().to_lowercase();
        if message.contains("connection reset") || message.contains("econnreset") {
            return true;
        }

        current = err.source();
    }

    false
}

fn is_dns_failure(chain: &str) -> bool {
    let chain = chain.to_lowercase();
    chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("name or service not known")
        || chain.contains("no such host")
}

/// Flattens an error and its sources into one message
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();

    while let Some(err) = current {
        parts.push(err.to_string());
        current = err.source();
    }

    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestScout".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "Mozilla/5.0 (compatible; TestScout/1.0; +https://example.com/about)"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::ConnectionReset("reset".into()).is_transient());
        assert!(TransportError::Timeout.is_transient());
        assert!(!TransportError::HttpStatus(503).is_transient());
        assert!(!TransportError::HttpStatus(404).is_transient());
        assert!(!TransportError::Dns("no such host".into()).is_transient());
        assert!(!TransportError::Malformed("bad chunk".into()).is_transient());
        assert!(!TransportError::Other("refused".into()).is_transient());
    }

    #[test]
    fn test_reset_found_in_source_chain() {
        let err = Wrapped(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        assert!(is_connection_reset(&err));

        let err = Wrapped(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(!is_connection_reset(&err));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = Wrapped(std::io::Error::new(std::io::ErrorKind::Other, "dns error"));
        let chain = error_chain(&err);
        assert_eq!(chain, "error sending request: dns error");
        assert!(is_dns_failure(&chain));
    }
}
