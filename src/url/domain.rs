use crate::UrlError;
use url::Url;

/// Extracts the hostname from a URL
///
/// The host is returned lowercase. Ports are not part of the hostname, so
/// `https://example.com:8080/` yields `example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a seed URL and returns it together with its hostname
///
/// A seed must be an absolute HTTP(S) URL with a host. This is the only
/// precondition a domain crawl has; a seed that fails it fails the whole
/// domain.
pub fn parse_seed(seed: &str) -> Result<(Url, String), UrlError> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let hostname = extract_domain(&url).ok_or_else(|| UrlError::MissingHost(seed.to_string()))?;

    Ok((url, hostname))
}
