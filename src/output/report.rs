//! Per-domain results and the aggregated report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters collected during one domain crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages fetched successfully
    pub pages_fetched: usize,

    /// Pages abandoned after a permanent error or exhausted retries
    pub pages_failed: usize,

    /// Distinct normalized URLs claimed by the traversal
    pub urls_visited: usize,

    /// Wall-clock duration of the crawl
    pub elapsed_ms: u64,
}

/// Outcome of crawling one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// The seed's hostname, or the raw seed when it could not be parsed
    pub hostname: String,

    /// Sorted, deduplicated normalized product URLs
    pub product_urls: Vec<String>,

    /// False when the domain crawl could not start or did not finish
    pub succeeded: bool,

    /// Why the crawl failed, when it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub stats: CrawlStats,
}

impl CrawlResult {
    /// A crawl that ran to completion
    pub fn success(hostname: impl Into<String>, product_urls: Vec<String>, stats: CrawlStats) -> Self {
        Self {
            hostname: hostname.into(),
            product_urls,
            succeeded: true,
            error: None,
            stats,
        }
    }

    /// A crawl that never produced anything
    pub fn failure(hostname: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            product_urls: Vec::new(),
            succeeded: false,
            error: Some(error.into()),
            stats: CrawlStats::default(),
        }
    }

    /// A crawl that stopped early but keeps what it found
    pub fn partial(
        hostname: impl Into<String>,
        product_urls: Vec<String>,
        error: impl Into<String>,
        stats: CrawlStats,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            product_urls,
            succeeded: false,
            error: Some(error.into()),
            stats,
        }
    }
}

/// Hostname-keyed collection of domain results
///
/// Built by the pool as crawls complete, or in one go with [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// SHA-256 of the configuration file that produced this report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    pub domains: BTreeMap<String, CrawlResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a domain result
    ///
    /// A second result for the same hostname replaces the first.
    pub fn insert(&mut self, result: CrawlResult) {
        if let Some(previous) = self.domains.insert(result.hostname.clone(), result) {
            tracing::warn!("Replacing earlier result for {}", previous.hostname);
        }
    }

    pub fn get(&self, hostname: &str) -> Option<&CrawlResult> {
        self.domains.get(hostname)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// hostname -> product URLs, for every domain including failed ones
    pub fn product_urls(&self) -> BTreeMap<String, Vec<String>> {
        self.domains
            .iter()
            .map(|(hostname, result)| (hostname.clone(), result.product_urls.clone()))
            .collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.domains.values().filter(|r| r.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.domains.values().filter(|r| !r.succeeded).count()
    }

    pub fn total_products(&self) -> usize {
        self.domains.values().map(|r| r.product_urls.len()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CrawlResult> {
        self.domains.values().filter(|r| !r.succeeded)
    }

    /// Wall-clock duration, once both timestamps are set
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).num_seconds()),
            _ => None,
        }
    }
}

/// Combines domain results into a report keyed by hostname
///
/// Pure: no timestamps or hash are set.
pub fn merge(results: impl IntoIterator<Item = CrawlResult>) -> Report {
    let mut report = Report::new();
    for result in results {
        report.insert(result);
    }
    report
}
