//! Per-domain crawl state
//!
//! Both sets live for exactly one domain crawl and are dropped once its
//! `CrawlResult` has been produced.
//!
//! # Components
//!
//! - `VisitedSet`: normalized URLs already claimed for fetching
//! - `ProductSet`: normalized URLs classified as product pages

mod products;
mod visited;

// Re-export main types
pub use products::ProductSet;
pub use visited::VisitedSet;
