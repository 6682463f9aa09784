/// Checks whether a hostname is covered by a classifier table key
///
/// Table keys come in two forms:
/// 1. Exact: "www.tatacliq.com" matches only "www.tatacliq.com"
/// 2. Wildcard: "*.example.com" matches "example.com" and any subdomain of it
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use catalog_scout::url::matches_hostname;
///
/// assert!(matches_hostname("nykaafashion.com", "nykaafashion.com"));
/// assert!(matches_hostname("*.example.com", "shop.example.com"));
/// assert!(!matches_hostname("*.example.com", "example.org"));
/// ```
pub fn matches_hostname(key: &str, hostname: &str) -> bool {
    match key.strip_prefix("*.") {
        Some(base) => {
            hostname == base
                || hostname
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => hostname == key,
    }
}

/// Returns true if the key is a wildcard entry
pub fn is_wildcard(key: &str) -> bool {
    key.starts_with("*.")
}
