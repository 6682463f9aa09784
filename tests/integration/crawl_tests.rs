//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use catalog_scout::config::{parse_config, CrawlerConfig, TraversalMode, UserAgentConfig};
use catalog_scout::crawler::{crawl, CrawlTask, DomainCrawler, HttpTransport};
use catalog_scout::output::{handlers_from_config, write_outputs};
use catalog_scout::ProductClassifier;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestScout".to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: "https://example.com/about".to_string(),
        accept_language: "en-US,en;q=0.9".to_string(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn crawler(settings: CrawlerConfig) -> DomainCrawler {
    let transport = Arc::new(HttpTransport::from_config(&user_agent()).unwrap());
    DomainCrawler::new(transport, Arc::new(ProductClassifier::builtin()), &settings)
}

fn fast_settings() -> CrawlerConfig {
    CrawlerConfig {
        base_delay_ms: 10,
        fetch_timeout_ms: 2000,
        ..CrawlerConfig::default()
    }
}

/// Mounts a small shop: home, about, two products (one reached with a query)
async fn mount_shop(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/product/1">One</a>
               <a href="/about">About</a>
               <a href="/product/2?color=red#reviews">Two</a>
               <a href="https://elsewhere.test/product/3">Other site</a>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="/product/1">One again</a><a href="/">Home</a>"#))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(html(r#"<a href="/">Home</a>"#))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(html(""))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;

    for traversal in [TraversalMode::Sequential, TraversalMode::Concurrent] {
        server.reset().await;
        mount_shop(&server).await;

        let crawler = crawler(CrawlerConfig {
            traversal,
            ..fast_settings()
        });
        let seed = format!("{}/", server.uri());

        let result = crawler
            .crawl_domain(&CrawlTask::new(seed, 2), &CancellationToken::new())
            .await;

        assert!(result.succeeded, "{:?}: {:?}", traversal, result.error);
        assert_eq!(result.hostname, "127.0.0.1");
        assert_eq!(
            result.product_urls,
            vec![
                format!("{}/product/1", server.uri()),
                format!("{}/product/2", server.uri()),
            ]
        );
        assert_eq!(result.stats.pages_fetched, 4);
        assert_eq!(result.stats.pages_failed, 0);

        server.verify().await;
    }
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/level1">1</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/level1"))
        .respond_with(html(r#"<a href="/product/deep">deep</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/deep"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawler(fast_settings())
        .crawl_domain(
            &CrawlTask::new(format!("{}/", server.uri()), 1),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.succeeded);
    assert!(result.product_urls.is_empty());
}

#[tokio::test]
async fn test_http_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/product/gone">Gone</a><a href="/product/ok">Ok</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/ok"))
        .respond_with(html(""))
        .mount(&server)
        .await;

    let result = crawler(CrawlerConfig {
        max_retries: 3,
        ..fast_settings()
    })
    .crawl_domain(
        &CrawlTask::new(format!("{}/", server.uri()), 1),
        &CancellationToken::new(),
    )
    .await;

    assert!(result.succeeded);
    assert_eq!(result.product_urls, vec![format!("{}/product/ok", server.uri())]);
    assert_eq!(result.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_timeout_retried_until_budget_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("").set_delay(Duration::from_millis(1000)))
        .expect(2)
        .mount(&server)
        .await;

    let result = crawler(CrawlerConfig {
        max_retries: 2,
        fetch_timeout_ms: 100,
        ..fast_settings()
    })
    .crawl_domain(
        &CrawlTask::new(format!("{}/", server.uri()), 1),
        &CancellationToken::new(),
    )
    .await;

    // A dead seed is a page failure, not a domain failure
    assert!(result.succeeded);
    assert_eq!(result.stats.pages_failed, 1);
    assert_eq!(result.stats.pages_fetched, 0);
}

#[tokio::test]
async fn test_content_type_handling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/product/manual.pdf">Manual</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/manual.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = crawler(fast_settings())
        .crawl_domain(
            &CrawlTask::new(format!("{}/", server.uri()), 2),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.succeeded);
    assert!(result.product_urls.is_empty());
    assert_eq!(result.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_requests_carry_identification_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "Mozilla/5.0 (compatible; TestScout/1.0; +https://example.com/about)",
        ))
        .and(header("accept-language", "en-US,en;q=0.9"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;

    let result = crawler(fast_settings())
        .crawl_domain(
            &CrawlTask::new(format!("{}/", server.uri()), 0),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_crawl_from_config_writes_report() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("products.json");
    let summary_path = dir.path().join("summary.md");

    let config = parse_config(&format!(
        r#"
[crawler]
max-depth = 2
base-delay-ms = 10
pool-size = 2

[user-agent]
crawler-name = "TestScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[output]
report-path = "{report}"
summary-path = "{summary}"
flat = true

[[seed]]
url = "{seed}/"

[[seed]]
url = "not a url"
"#,
        report = report_path.display(),
        summary = summary_path.display(),
        seed = server.uri(),
    ))
    .unwrap();

    let report = crawl(&config, Some("abc123".to_string()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.config_hash.as_deref(), Some("abc123"));
    assert!(!report.get("not a url").unwrap().succeeded);

    let handlers = handlers_from_config(&config.output, None);
    write_outputs(&handlers, &report).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(
        written,
        serde_json::json!({
            "127.0.0.1": [
                format!("{}/product/1", server.uri()),
                format!("{}/product/2", server.uri()),
            ],
            "not a url": [],
        })
    );

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("- **Failed**: 1"));
}
