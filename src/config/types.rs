use serde::{Deserialize, Serialize};

/// Main configuration structure for Catalog-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedEntry>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default, rename = "domain")]
    pub domains: Vec<DomainPatternEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URL (the seed is depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Total fetch attempts per URL before a transient failure is final
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; attempt k waits base * 2^(k-2)
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Deadline for a single fetch attempt (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Number of domains crawled concurrently
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: usize,

    /// How pages within one domain are traversed
    #[serde(default)]
    pub traversal: TraversalMode,

    /// Maximum simultaneous fetches against one domain in concurrent mode
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Optional wall-clock limit for a single domain crawl (seconds)
    #[serde(rename = "domain-deadline-secs", default)]
    pub domain_deadline_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            pool_size: default_pool_size(),
            traversal: TraversalMode::default(),
            max_in_flight: default_max_in_flight(),
            domain_deadline_secs: None,
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_pool_size() -> usize {
    4
}

fn default_max_in_flight() -> usize {
    8
}

/// Within-domain traversal policy
///
/// `Sequential` fetches one page at a time, depth first, in document order.
/// It is gentle on the remote origin but a domain takes as long as the sum
/// of its page latencies. `Concurrent` keeps up to `max-in-flight` fetches
/// open against the domain at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    Sequential,
    #[default]
    Concurrent,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version; +ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON report
    #[serde(rename = "report-path")]
    pub report_path: String,

    /// Optional path of a markdown summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,

    /// Write the report as a plain hostname -> product URL list mapping
    #[serde(default)]
    pub flat: bool,
}

/// A seed URL with optional per-domain overrides
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Root URL of the domain to crawl
    pub url: String,

    /// Overrides `crawler.max-depth` for this domain
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Overrides `crawler.max-in-flight` for this domain
    #[serde(rename = "max-in-flight", default)]
    pub max_in_flight: Option<usize>,
}

/// Product pattern table settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Replaces the built-in default pattern set
    #[serde(rename = "default-patterns", default)]
    pub default_patterns: Option<Vec<String>>,

    /// Whether the built-in per-hostname table is loaded
    #[serde(rename = "builtin-domains", default = "default_true")]
    pub builtin_domains: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_patterns: None,
            builtin_domains: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Product patterns for one hostname (or `*.` wildcard)
#[derive(Debug, Clone, Deserialize)]
pub struct DomainPatternEntry {
    pub hostname: String,

    /// Regular expressions matched against page URLs
    #[serde(rename = "product-patterns")]
    pub product_patterns: Vec<String>,
}
