//! Product URL classification
//!
//! A URL is a product URL when at least one pattern of the pattern set
//! selected for its hostname matches it. Hostnames without an entry in the
//! table fall back to the default pattern set.

use crate::config::Config;
use crate::url::matcher::{is_wildcard, matches_hostname};
use crate::ScoutError;
use regex::Regex;
use std::collections::HashMap;

/// Default product patterns, used for hostnames with no table entry
pub const DEFAULT_PATTERNS: &[&str] = &[r"(?i)/product", r"(?i)/p/", r"(?i)/item", r"(?i)-\d+$"];

/// Built-in per-hostname product patterns
pub const BUILTIN_DOMAINS: &[(&str, &[&str])] = &[
    ("www.virgio.com", &[r"(?i)/product", r"(?i)/item"]),
    ("www.tatacliq.com", &[r"(?i)/p/"]),
    ("nykaafashion.com", &[r"(?i)/product"]),
    ("www.westside.com", &[r"(?i)/product"]),
];

/// An ordered set of compiled product patterns
///
/// Order only documents intent; matching is existential.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compiles a list of regular expressions into a pattern set
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self, ScoutError> {
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source.as_ref()).map_err(|e| ScoutError::Pattern {
                    pattern: source.as_ref().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if any pattern matches the URL
    pub fn is_match(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }

    /// Returns the pattern sources in declaration order
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Hostname-keyed product pattern table with a default fallback
///
/// Lookup order for a hostname:
/// 1. Exact table entry
/// 2. First wildcard entry (`*.example.com`) that covers the hostname
/// 3. The default pattern set
#[derive(Debug, Clone)]
pub struct ProductClassifier {
    exact: HashMap<String, PatternSet>,
    wildcards: Vec<(String, PatternSet)>,
    default: PatternSet,
}

impl ProductClassifier {
    /// Creates a classifier with an empty table and the given default set
    pub fn new(default: PatternSet) -> Self {
        Self {
            exact: HashMap::new(),
            wildcards: Vec::new(),
            default,
        }
    }

    /// Creates a classifier holding the built-in table and default patterns
    pub fn builtin() -> Self {
        let mut classifier =
            Self::new(PatternSet::compile(DEFAULT_PATTERNS).expect("built-in patterns compile"));

        for (hostname, patterns) in BUILTIN_DOMAINS {
            let set = PatternSet::compile(*patterns).expect("built-in patterns compile");
            classifier.insert(hostname, set);
        }

        classifier
    }

    /// Builds the classifier described by the configuration
    ///
    /// Starts from the built-in table unless `classifier.builtin-domains` is
    /// false, then applies `[[domain]]` entries (replacing built-in entries
    /// for the same hostname) and `classifier.default-patterns`.
    pub fn from_config(config: &Config) -> Result<Self, ScoutError> {
        let mut classifier = if config.classifier.builtin_domains {
            Self::builtin()
        } else {
            Self::new(PatternSet::compile(DEFAULT_PATTERNS)?)
        };

        if let Some(defaults) = &config.classifier.default_patterns {
            classifier.default = PatternSet::compile(defaults.as_slice())?;
        }

        for entry in &config.domains {
            let set = PatternSet::compile(entry.product_patterns.as_slice())?;
            classifier.insert(&entry.hostname, set);
        }

        Ok(classifier)
    }

    /// Adds or replaces the pattern set for a hostname key
    pub fn insert(&mut self, key: &str, patterns: PatternSet) {
        let key = key.to_lowercase();
        if is_wildcard(&key) {
            match self.wildcards.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => *existing = patterns,
                None => self.wildcards.push((key, patterns)),
            }
        } else {
            self.exact.insert(key, patterns);
        }
    }

    /// Builder-style variant of [`ProductClassifier::insert`]
    pub fn with_domain(mut self, key: &str, patterns: PatternSet) -> Self {
        self.insert(key, patterns);
        self
    }

    /// Selects the pattern set for a hostname
    pub fn patterns_for(&self, hostname: &str) -> &PatternSet {
        let hostname = hostname.to_lowercase();

        if let Some(set) = self.exact.get(&hostname) {
            return set;
        }

        self.wildcards
            .iter()
            .find(|(key, _)| matches_hostname(key, &hostname))
            .map(|(_, set)| set)
            .unwrap_or(&self.default)
    }

    /// Returns true if the URL is a product URL for the given hostname
    pub fn is_product_url(&self, url: &str, hostname: &str) -> bool {
        self.patterns_for(hostname).is_match(url)
    }

    /// The default pattern set
    pub fn default_patterns(&self) -> &PatternSet {
        &self.default
    }

    /// Table entries sorted by key, for display
    pub fn entries(&self) -> Vec<(&str, &PatternSet)> {
        let mut entries: Vec<(&str, &PatternSet)> = self
            .exact
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .chain(self.wildcards.iter().map(|(k, v)| (k.as_str(), v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl Default for ProductClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
