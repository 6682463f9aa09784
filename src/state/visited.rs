use dashmap::DashSet;
use std::sync::Arc;

/// The set of normalized URLs one domain crawl has claimed for fetching
///
/// A URL is claimed *before* its fetch starts. `try_claim` is an atomic
/// insert-if-absent, so when two branches discover the same URL at the same
/// time exactly one of them gets `true` and goes on to fetch it.
///
/// Cloning yields another handle to the same set. A set is created per
/// domain crawl and is never shared across domains.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<DashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a normalized URL, returning true if it was not yet visited
    pub fn try_claim(&self, key: &str) -> bool {
        self.inner.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let visited = VisitedSet::new();
        assert!(visited.try_claim("https://a.test/x"));
        assert!(!visited.try_claim("https://a.test/x"));
        assert!(visited.contains("https://a.test/x"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let visited = VisitedSet::new();
        let other = visited.clone();
        assert!(other.try_claim("https://a.test/"));
        assert!(!visited.try_claim("https://a.test/"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_single_winner() {
        let visited = VisitedSet::new();
        let mut handles = Vec::new();

        for _ in 0..32 {
            let visited = visited.clone();
            handles.push(tokio::spawn(async move {
                (0..100)
                    .filter(|i| visited.try_claim(&format!("https://a.test/{}", i)))
                    .count()
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        // Every URL claimed exactly once across all tasks
        assert_eq!(total, 100);
        assert_eq!(visited.len(), 100);
    }
}
