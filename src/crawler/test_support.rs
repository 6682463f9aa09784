//! In-memory transport for crawler tests

use crate::crawler::transport::{Response, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// A scripted web: static pages, queued failures, optional latency
///
/// Unknown URLs answer HTTP 404. Queued failures for a URL are returned, in
/// order, before the page itself is served.
#[derive(Default)]
pub struct SiteTransport {
    pages: HashMap<String, ScriptedPage>,
    failures: Mutex<HashMap<String, VecDeque<TransportError>>>,
    panics: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_hosts: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct ScriptedPage {
    content_type: String,
    body: String,
    final_url: Option<Url>,
}

impl SiteTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ScriptedPage {
                content_type: "text/html; charset=utf-8".to_string(),
                body: html.to_string(),
                final_url: None,
            },
        );
        self
    }

    /// Serves `html` for `url` as if the request had been redirected to `final_url`
    pub fn redirected(mut self, url: &str, final_url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ScriptedPage {
                content_type: "text/html; charset=utf-8".to_string(),
                body: html.to_string(),
                final_url: Some(Url::parse(final_url).unwrap()),
            },
        );
        self
    }

    pub fn asset(mut self, url: &str, content_type: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ScriptedPage {
                content_type: content_type.to_string(),
                body: String::new(),
                final_url: None,
            },
        );
        self
    }

    pub fn fail(self, url: &str, error: TransportError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(error);
        self
    }

    pub fn panic_on(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    pub fn call_times(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn requested(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    /// Highest number of distinct hosts with a request open at the same time
    pub fn max_concurrent_hosts(&self) -> usize {
        self.max_hosts.load(Ordering::SeqCst)
    }

    /// Highest number of requests open at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self, host: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        *in_flight.entry(host.to_string()).or_default() += 1;
        let total: usize = in_flight.values().sum();
        self.max_hosts.fetch_max(in_flight.len(), Ordering::SeqCst);
        self.max_in_flight.fetch_max(total, Ordering::SeqCst);
    }

    fn leave(&self, host: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(count) = in_flight.get_mut(host) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(host);
            }
        }
    }
}

struct InFlight<'a> {
    transport: &'a SiteTransport,
    host: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.transport.leave(&self.host);
    }
}

#[async_trait]
impl Transport for SiteTransport {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<Response, TransportError> {
        let key = url.as_str().to_string();
        self.calls.lock().unwrap().push((key.clone(), Instant::now()));

        if self.panics.contains(&key) {
            panic!("scripted panic for {}", key);
        }

        let host = url.host_str().unwrap_or_default().to_string();
        self.enter(&host);
        let _guard = InFlight {
            transport: self,
            host,
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let queued = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|q| q.pop_front());
        if let Some(error) = queued {
            return Err(error);
        }

        match self.pages.get(&key) {
            Some(page) => Ok(Response {
                final_url: page.final_url.clone().unwrap_or_else(|| url.clone()),
                status: 200,
                content_type: Some(page.content_type.clone()),
                body: page.body.clone(),
            }),
            None => Err(TransportError::HttpStatus(404)),
        }
    }
}
