//! URL handling module for Catalog-Scout
//!
//! This module provides URL normalization, hostname extraction, hostname
//! table matching, and product URL classification.

pub mod classifier;
mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use classifier::{PatternSet, ProductClassifier, BUILTIN_DOMAINS, DEFAULT_PATTERNS};
pub use domain::{extract_domain, parse_seed};
pub use matcher::{is_wildcard, matches_hostname};
pub use normalize::{normalize_parsed, normalize_url};

/// Returns true if the URL's hostname equals the given hostname
///
/// This is the same-host policy applied to every discovered link: links to
/// any other host, including subdomains of the seed host, are never followed.
pub fn is_same_host(url: &::url::Url, hostname: &str) -> bool {
    extract_domain(url).is_some_and(|host| host == hostname)
}
