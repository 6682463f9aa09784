use std::collections::BTreeSet;

/// Normalized product URLs found by one domain crawl
///
/// Kept sorted so reports are stable across runs regardless of the order in
/// which concurrent fetches complete.
#[derive(Debug, Clone, Default)]
pub struct ProductSet {
    urls: BTreeSet<String>,
}

impl ProductSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a product URL, returning true if it was new
    pub fn insert(&mut self, normalized: String) -> bool {
        self.urls.insert(normalized)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Consumes the set, yielding URLs in sorted order
    pub fn into_sorted_vec(self) -> Vec<String> {
        self.urls.into_iter().collect()
    }
}
