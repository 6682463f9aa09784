//! Crawl pool scheduler
//!
//! Runs domain crawls with at most `pool_size` active at once. A slot is
//! refilled as soon as any crawl finishes, so a slow domain never holds up
//! the rest of the queue.
//!
//! Each domain crawl runs in its own `tokio` task. A panic inside a crawl is
//! caught at that task's boundary and recorded as a failed result for the
//! domain; the other crawls are unaffected.

use crate::crawler::engine::{CrawlTask, DomainCrawler};
use crate::output::{CrawlResult, Report};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Bounded pool of concurrent domain crawls
#[derive(Debug, Clone)]
pub struct CrawlPool {
    crawler: DomainCrawler,
    pool_size: usize,
    cancel: CancellationToken,
    active: Arc<ActiveCrawls>,
}

/// Live and peak number of running domain crawls
#[derive(Debug, Default)]
struct ActiveCrawls {
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveCrawls {
    fn enter(self: &Arc<Self>) -> ActiveGuard {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);
        ActiveGuard(Arc::clone(self))
    }
}

/// Decrements the live count when a crawl ends, including by panic
struct ActiveGuard(Arc<ActiveCrawls>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CrawlPool {
    /// Creates a pool; a size of zero is treated as one
    pub fn new(crawler: DomainCrawler, pool_size: usize) -> Self {
        Self {
            crawler,
            pool_size: pool_size.max(1),
            cancel: CancellationToken::new(),
            active: Arc::new(ActiveCrawls::default()),
        }
    }

    /// Ties the pool to an external cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Domain crawls running right now
    pub fn active_crawls(&self) -> usize {
        self.active.live.load(Ordering::SeqCst)
    }

    /// Most domain crawls ever running at once in this pool
    pub fn peak_active_crawls(&self) -> usize {
        self.active.peak.load(Ordering::SeqCst)
    }

    /// Cancels every running crawl; each keeps the products found so far
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Runs every task and returns once each has produced a result
    ///
    /// The report has one entry per distinct task key. Tasks still queued
    /// when the pool is cancelled are started anyway and end immediately as
    /// cancelled crawls, so they still appear in the report.
    pub async fn run(&self, tasks: Vec<CrawlTask>) -> Report {
        let total = tasks.len();
        tracing::info!(
            "Starting {} domain crawls with pool size {}",
            total,
            self.pool_size
        );

        let mut report = Report::new();
        report.started_at = Some(chrono::Utc::now());

        let mut pending: BTreeSet<String> = BTreeSet::new();
        let mut queue = tasks.into_iter();
        let mut running: JoinSet<CrawlResult> = JoinSet::new();

        for task in queue.by_ref().take(self.pool_size) {
            pending.insert(task.report_key());
            self.spawn_domain(&mut running, task);
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(result) => {
                    pending.remove(&result.hostname);
                    log_result(&result, report.len() + 1, total);
                    report.insert(result);
                }
                Err(e) => tracing::error!("Domain slot task failed: {}", e),
            }

            if let Some(task) = queue.next() {
                pending.insert(task.report_key());
                self.spawn_domain(&mut running, task);
            }
        }

        // Only reachable if a slot task itself died; keep every domain listed
        for key in pending {
            report.insert(CrawlResult::failure(key, "crawl task aborted"));
        }

        report.finished_at = Some(chrono::Utc::now());
        tracing::info!(
            "All domains finished: {} succeeded, {} failed, {} product URLs (peak {} active)",
            report.succeeded_count(),
            report.failed_count(),
            report.total_products(),
            self.peak_active_crawls()
        );

        report
    }

    /// Occupies one pool slot with a domain crawl
    ///
    /// The crawl itself runs in a nested task so a panic surfaces here as a
    /// `JoinError` and can be turned into a result for the right domain.
    fn spawn_domain(&self, running: &mut JoinSet<CrawlResult>, task: CrawlTask) {
        let crawler = self.crawler.clone();
        let cancel = self.cancel.clone();
        let active = Arc::clone(&self.active);

        running.spawn(async move {
            let key = task.report_key();
            let crawl = tokio::spawn(async move {
                let _active = active.enter();
                crawler.crawl_domain(&task, &cancel).await
            });

            match crawl.await {
                Ok(result) => result,
                Err(e) => {
                    let message = join_error_message(e);
                    tracing::error!("Crawl of {} failed: {}", key, message);
                    CrawlResult::failure(key, message)
                }
            }
        });
    }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "crawl task cancelled".to_string();
    }

    let payload = error.into_panic();
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    format!("crawl task panicked: {}", detail)
}

fn log_result(result: &CrawlResult, done: usize, total: usize) {
    if result.succeeded {
        tracing::info!(
            "[{}/{}] {}: {} product URLs",
            done,
            total,
            result.hostname,
            result.product_urls.len()
        );
    } else {
        tracing::warn!(
            "[{}/{}] {} failed: {}",
            done,
            total,
            result.hostname,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
