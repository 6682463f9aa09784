//! Catalog-Scout: a product page discovery crawler
//!
//! This crate walks the internal link graph of e-commerce sites, starting from
//! one seed URL per domain, and reports every page whose URL looks like a
//! product detail page. Domains are crawled by a bounded worker pool, each
//! domain crawl is depth-limited and never fetches the same URL twice, and
//! transient network failures are retried with exponential backoff.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid product pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid product pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Catalog-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlPool, CrawlTask, DomainCrawler};
pub use output::{merge, CrawlResult, Report};
pub use url::{extract_domain, normalize_url, ProductClassifier};
