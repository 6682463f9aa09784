//! Crawler module for discovering product pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and fetching with retry logic
//! - HTML parsing and same-host link extraction
//! - Depth-bounded traversal of a single domain
//! - The bounded pool that runs many domain crawls at once

mod engine;
mod fetcher;
mod parser;
mod pool;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{CrawlTask, DomainCrawler};
pub use fetcher::{fetch_with_retry, FailureReason, FetchFailure, FetchedPage, RetryPolicy};
pub use parser::{extract_links, parse_html, ParsedPage};
pub use pool::CrawlPool;
pub use transport::{build_http_client, HttpTransport, Response, Transport, TransportError};

use crate::config::Config;
use crate::output::Report;
use crate::url::ProductClassifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the product classifier from the configured patterns
/// 2. Build the HTTP client
/// 3. Crawl every seed domain through a pool of `pool-size` slots
/// 4. Return the aggregated report, stamped with `config_hash`
///
/// Cancelling `cancel` stops every domain early; the report still lists
/// every seed.
pub async fn crawl(
    config: &Config,
    config_hash: Option<String>,
    cancel: CancellationToken,
) -> crate::Result<Report> {
    let classifier = Arc::new(ProductClassifier::from_config(config)?);
    let transport = Arc::new(HttpTransport::from_config(&config.user_agent)?);

    let crawler = DomainCrawler::new(transport, classifier, &config.crawler);
    let pool = CrawlPool::new(crawler, config.crawler.pool_size).with_cancellation(cancel);

    let mut report = pool.run(CrawlTask::from_config(config)).await;
    report.config_hash = config_hash;

    Ok(report)
}
