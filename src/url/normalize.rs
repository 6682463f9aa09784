use url::Url;

/// Normalizes a URL into the key used for deduplication and classification
///
/// # Normalization Steps
///
/// 1. Parse the URL; if it is malformed, return the input unchanged
/// 2. Remove the query string
/// 3. Remove the fragment
///
/// The normalized form is only a key. Pages are still fetched with the URL
/// as it was discovered, query string included.
///
/// Normalization is idempotent: `normalize_url(&normalize_url(x)) == normalize_url(x)`.
///
/// # Examples
///
/// ```
/// use catalog_scout::url::normalize_url;
///
/// assert_eq!(normalize_url("https://a.com/x?y=1#z"), "https://a.com/x");
/// assert_eq!(normalize_url("not a url"), "not a url");
/// ```
pub fn normalize_url(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(url) => normalize_parsed(&url),
        Err(_) => url_str.to_string(),
    }
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}
