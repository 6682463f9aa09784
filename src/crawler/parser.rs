//! HTML parser for extracting same-host links
//!
//! This module handles parsing fetched HTML to extract:
//! - Links to follow (from `<a>` and `<area>` tags), restricted to the
//!   crawl's hostname
//! - The page title, for logging

use crate::url::is_same_host;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Absolute same-host links found on the page
    pub links: BTreeSet<String>,
}

/// Parses HTML content and extracts same-host links and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` and `<area href="...">` resolving to `hostname`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - hrefs that fail to resolve against `origin`
/// - Non-HTTP(S) URLs after resolution
/// - Links to any other hostname
///
/// Fragments are dropped from the resolved links; query strings are kept.
///
/// # Example
///
/// ```
/// use catalog_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Home</title></head><body>
///     <a href="/product/1">Shirt</a>
///     <a href="https://elsewhere.test/">Other site</a>
/// </body></html>"#;
/// let origin = Url::parse("https://site-a.test/").unwrap();
/// let parsed = parse_html(html, &origin, "site-a.test");
/// assert_eq!(parsed.title, Some("Home".to_string()));
/// assert!(parsed.links.contains("https://site-a.test/product/1"));
/// assert_eq!(parsed.links.len(), 1);
/// ```
pub fn parse_html(html: &str, origin: &Url, hostname: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, origin, hostname),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the set of absolute same-host links from a parsed document
///
/// Duplicates within the page collapse. Deduplication against pages already
/// visited is left to the caller.
pub fn extract_links(document: &Html, origin: &Url, hostname: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(url) = resolve_link(href, origin) {
            if is_same_host(&url, hostname) {
                links.insert(url.to_string());
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, origin: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute = origin.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}
