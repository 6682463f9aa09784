//! Domain crawl engine
//!
//! One [`DomainCrawler::crawl_domain`] call walks the same-host link graph of
//! a single seed. The traversal is an explicit frontier of `(url, depth)`
//! pairs drained by a bounded number of in-flight fetches:
//!
//! 1. Pop the next frontier entry
//! 2. Drop it if its depth exceeds the task's max depth
//! 3. Claim its normalized form in the visited set; drop it if already claimed
//! 4. Fetch it with retry; a failed fetch ends that branch only
//! 5. Record it as a product if its normalized URL classifies as one
//! 6. Push its same-host links at depth + 1
//!
//! The visited set only grows, depth is bounded and the host is fixed, so
//! the traversal always terminates.

use crate::config::{Config, CrawlerConfig, TraversalMode};
use crate::crawler::fetcher::{fetch_with_retry, FetchFailure, FetchedPage, RetryPolicy};
use crate::crawler::parser::parse_html;
use crate::crawler::transport::Transport;
use crate::output::{CrawlResult, CrawlStats};
use crate::state::{ProductSet, VisitedSet};
use crate::url::{normalize_parsed, parse_seed, ProductClassifier};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One unit of work for the pool: crawl a single seed domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Root URL of the domain
    pub seed_url: String,

    /// Maximum link depth from the seed (the seed is depth 0)
    pub max_depth: u32,

    /// Per-domain cap on simultaneous fetches; falls back to the crawler's
    pub max_in_flight: Option<usize>,
}

impl CrawlTask {
    pub fn new(seed_url: impl Into<String>, max_depth: u32) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth,
            max_in_flight: None,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    /// Builds one task per configured seed, applying per-seed overrides
    pub fn from_config(config: &Config) -> Vec<CrawlTask> {
        config
            .seeds
            .iter()
            .map(|seed| CrawlTask {
                seed_url: seed.url.trim().to_string(),
                max_depth: seed.max_depth.unwrap_or(config.crawler.max_depth),
                max_in_flight: seed.max_in_flight,
            })
            .collect()
    }

    /// The key this task's result is reported under
    ///
    /// This is the seed's hostname, or the raw seed string when the seed
    /// cannot be parsed.
    pub fn report_key(&self) -> String {
        parse_seed(&self.seed_url)
            .map(|(_, hostname)| hostname)
            .unwrap_or_else(|_| self.seed_url.clone())
    }
}

type FetchOutcome = (Url, u32, Result<FetchedPage, FetchFailure>);

/// Crawls single domains; cheap to clone and share across pool slots
#[derive(Clone)]
pub struct DomainCrawler {
    transport: Arc<dyn Transport>,
    classifier: Arc<ProductClassifier>,
    retry: RetryPolicy,
    traversal: TraversalMode,
    max_in_flight: usize,
    deadline: Option<Duration>,
}

impl DomainCrawler {
    /// Creates a crawler from the crawler section of the configuration
    pub fn new(
        transport: Arc<dyn Transport>,
        classifier: Arc<ProductClassifier>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            transport,
            classifier,
            retry: RetryPolicy::from_config(config),
            traversal: config.traversal,
            max_in_flight: config.max_in_flight.max(1),
            deadline: config.domain_deadline_secs.map(Duration::from_secs),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Number of fetches this crawler keeps open for the given task
    pub fn in_flight_limit(&self, task: &CrawlTask) -> usize {
        match self.traversal {
            TraversalMode::Sequential => 1,
            TraversalMode::Concurrent => task.max_in_flight.unwrap_or(self.max_in_flight).max(1),
        }
    }

    /// Crawls one domain to completion
    ///
    /// Never fails because of individual pages. The result is unsuccessful
    /// only when the seed is unusable, or when the crawl was cancelled or
    /// ran past its deadline; in the latter case the products found so far
    /// are kept.
    ///
    /// A panic inside a page fetch is re-raised so the caller's task
    /// boundary records the whole domain as failed.
    pub async fn crawl_domain(&self, task: &CrawlTask, cancel: &CancellationToken) -> CrawlResult {
        let started = Instant::now();

        let (seed, hostname) = match parse_seed(&task.seed_url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid seed {}: {}", task.seed_url, e);
                return CrawlResult::failure(task.report_key(), format!("invalid seed URL: {}", e));
            }
        };

        let cancel = cancel.child_token();
        let _deadline = self
            .deadline
            .map(|deadline| DeadlineTimer::start(deadline, cancel.clone()));

        let limit = self.in_flight_limit(task);
        tracing::info!(
            "Crawling {} (max depth {}, {:?}, {} in flight)",
            hostname,
            task.max_depth,
            self.traversal,
            limit
        );

        let visited = VisitedSet::new();
        let mut products = ProductSet::new();
        let mut stats = CrawlStats::default();
        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        let mut fetches: JoinSet<FetchOutcome> = JoinSet::new();

        frontier.push_back((seed, 0));

        loop {
            while fetches.len() < limit && !cancel.is_cancelled() {
                let Some((url, depth)) = self.next_entry(&mut frontier) else {
                    break;
                };

                if depth > task.max_depth {
                    continue;
                }

                if !visited.try_claim(&normalize_parsed(&url)) {
                    continue;
                }

                let transport = Arc::clone(&self.transport);
                let retry = self.retry;
                let token = cancel.clone();
                fetches.spawn(async move {
                    let result = fetch_with_retry(transport.as_ref(), &url, &retry, &token).await;
                    (url, depth, result)
                });
            }

            let Some(joined) = fetches.join_next().await else {
                break;
            };

            let (url, depth, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    tracing::debug!("Fetch task for {} aborted: {}", hostname, e);
                    continue;
                }
            };

            match result {
                Ok(page) => {
                    stats.pages_fetched += 1;
                    self.record_product(&hostname, &url, &mut products);

                    if depth < task.max_depth {
                        let links = self.extract_children(&hostname, &url, &page);
                        self.enqueue(&mut frontier, &visited, links, depth + 1);
                    }
                }
                Err(failure) if failure.is_cancelled() => {}
                Err(failure) => {
                    stats.pages_failed += 1;
                    tracing::debug!("{}", failure);
                }
            }
        }

        stats.urls_visited = visited.len();
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        if cancel.is_cancelled() {
            let reason = match self.deadline {
                Some(deadline) if started.elapsed() >= deadline => {
                    format!("deadline of {}s exceeded", deadline.as_secs())
                }
                _ => "crawl cancelled".to_string(),
            };
            tracing::warn!(
                "Crawl of {} stopped early ({}), keeping {} product URLs",
                hostname,
                reason,
                products.len()
            );
            return CrawlResult::partial(hostname, products.into_sorted_vec(), reason, stats);
        }

        tracing::info!(
            "Finished {}: {} pages fetched, {} failed, {} product URLs",
            hostname,
            stats.pages_fetched,
            stats.pages_failed,
            products.len()
        );

        CrawlResult::success(hostname, products.into_sorted_vec(), stats)
    }

    fn record_product(&self, hostname: &str, url: &Url, products: &mut ProductSet) {
        let key = normalize_parsed(url);
        if self.classifier.is_product_url(&key, hostname) && products.insert(key.clone()) {
            tracing::debug!("Found product URL: {}", key);
        }
    }

    /// Same-host links of a fetched page
    ///
    /// Relative links resolve against the requested URL, not the post-redirect
    /// one, so a seed that redirects to another host still yields links on
    /// the seed's host.
    fn extract_children(&self, hostname: &str, url: &Url, page: &FetchedPage) -> Vec<Url> {
        if page.final_url != *url {
            tracing::debug!("{} redirected to {}", url, page.final_url);
        }

        let parsed = parse_html(&page.body, url, hostname);
        tracing::trace!(
            "{} ({:?}) links to {} same-host pages",
            url,
            parsed.title,
            parsed.links.len()
        );

        parsed
            .links
            .into_iter()
            .filter_map(|link| Url::parse(&link).ok())
            .collect()
    }

    /// Pushes links that have not been claimed yet
    ///
    /// `try_claim` at dispatch stays authoritative; this only keeps the
    /// frontier from filling up with pages already visited.
    fn enqueue(
        &self,
        frontier: &mut VecDeque<(Url, u32)>,
        visited: &VisitedSet,
        links: Vec<Url>,
        depth: u32,
    ) {
        let children = links
            .into_iter()
            .filter(|link| !visited.contains(&normalize_parsed(link)))
            .map(|link| (link, depth));

        match self.traversal {
            // Stack: push in reverse so the first link is explored first
            TraversalMode::Sequential => {
                let children: Vec<_> = children.collect();
                frontier.extend(children.into_iter().rev());
            }
            TraversalMode::Concurrent => frontier.extend(children),
        }
    }

    fn next_entry(&self, frontier: &mut VecDeque<(Url, u32)>) -> Option<(Url, u32)> {
        match self.traversal {
            TraversalMode::Sequential => frontier.pop_back(),
            TraversalMode::Concurrent => frontier.pop_front(),
        }
    }
}

/// Cancels a crawl's token once its deadline passes
///
/// The timer task is aborted when the guard drops, including when the crawl
/// unwinds from a panic.
struct DeadlineTimer {
    handle: JoinHandle<()>,
}

impl DeadlineTimer {
    fn start(deadline: Duration, token: CancellationToken) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            token.cancel();
        });
        Self { handle }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for DomainCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainCrawler")
            .field("retry", &self.retry)
            .field("traversal", &self.traversal)
            .field("max_in_flight", &self.max_in_flight)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
