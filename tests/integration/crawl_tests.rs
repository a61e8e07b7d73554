//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use hostcrawl::config::{Config, CrawlerConfig, UserAgentConfig};
use hostcrawl::crawler::{build_http_client, fetch_page};
use hostcrawl::output::write_sitemap;
use hostcrawl::{crawl, parse_seed, FetchError};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a small test configuration
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            timeout: Duration::from_secs(5),
            rate_limit: 0,
            fetch_workers: 4,
            parse_workers: 2,
            channel_capacity: 16,
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
        .mount(server)
        .await;
}

fn seed_of(server: &MockServer) -> Url {
    parse_seed(&server.uri()).expect("mock server uri is a valid seed")
}

fn page_url(server: &MockServer, page: &str) -> String {
    format!("{}{}", server.uri(), page)
}

fn test_client() -> reqwest::Client {
    build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default())
        .expect("client builds")
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"
        <a href="/page1">Page 1</a>
        <a href="page2">Page 2</a>
        <a href="/missing">Broken</a>
        <a href="/doc.pdf">PDF</a>
        <a href="http://other.test/elsewhere">External</a>
        <a href="/">Home</a>
        <img src="/logo">
        "#,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<a href="/">Home</a> <a href="/page2#top">Page 2</a>"#,
    )
    .await;
    mount_page(&server, "/page2", "no links here").await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 3);
    assert_eq!(result.error_count, 1);

    let root = format!("{}/", server.uri());
    assert_eq!(
        result.links[&root],
        vec![
            page_url(&server, "/page1"),
            page_url(&server, "/page2"),
            page_url(&server, "/missing"),
        ]
    );
    assert_eq!(
        result.links[&page_url(&server, "/page1")],
        vec![page_url(&server, "/page2")]
    );
    assert!(result.links[&page_url(&server, "/page2")].is_empty());
    assert!(!result.links.contains_key(&page_url(&server, "/missing")));
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">A</a> <a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/b">B</a> <a href="/">Home</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<a href="/a/">A</a> <a href="/b?">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 3);
    assert_eq!(result.error_count, 0);
}

#[tokio::test]
async fn test_failed_seed_gives_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert!(result.is_empty());
    assert_eq!(result.error_count, 1);
}

#[tokio::test]
async fn test_non_html_page_is_processed_without_children() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/data">Data</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x00, 0xff, 0x10, 0x80])
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 2);
    assert!(result.links[&page_url(&server, "/data")].is_empty());
}

#[tokio::test]
async fn test_user_agent_header() {
    let server = MockServer::start().await;
    let user_agent = format!("hostcrawl/{}", env!("CARGO_PKG_VERSION"));

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", user_agent.as_str()))
        .respond_with(html("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 1);
}

#[tokio::test]
async fn test_rate_limited_crawl() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">A</a> <a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "").await;
    mount_page(&server, "/b", "").await;

    let mut config = create_test_config();
    // One request every 100ms
    config.crawler.rate_limit = 600;

    let start = Instant::now();
    let result = crawl(seed_of(&server), &config)
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_three_redirects_are_followed() {
    let server = MockServer::start().await;

    mount_redirect(&server, "/r1", "/r2").await;
    mount_redirect(&server, "/r2", "/r3").await;
    mount_redirect(&server, "/r3", "/final").await;
    mount_page(&server, "/final", "arrived").await;

    let url = Url::parse(&page_url(&server, "/r1")).unwrap();
    let body = fetch_page(&test_client(), &url)
        .await
        .expect("three redirects are within the limit");

    assert!(String::from_utf8_lossy(&body).contains("arrived"));
}

#[tokio::test]
async fn test_fourth_redirect_is_not_followed() {
    let server = MockServer::start().await;

    mount_redirect(&server, "/s1", "/s2").await;
    mount_redirect(&server, "/s2", "/s3").await;
    mount_redirect(&server, "/s3", "/s4").await;
    mount_redirect(&server, "/s4", "/s5").await;
    mount_page(&server, "/s5", "too far").await;

    let url = Url::parse(&page_url(&server, "/s1")).unwrap();
    let err = fetch_page(&test_client(), &url).await.unwrap_err();

    // The last redirect response is used as-is, which is not a 200
    assert!(matches!(err, FetchError::Status { status: 302, .. }));
}

#[tokio::test]
async fn test_cross_host_redirect_is_rejected() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(&other, "/landing", "other host").await;
    mount_redirect(&server, "/away", &page_url(&other, "/landing")).await;

    let url = Url::parse(&page_url(&server, "/away")).unwrap();
    let err = fetch_page(&test_client(), &url).await.unwrap_err();

    assert!(matches!(err, FetchError::RedirectPolicy { .. }));
}

#[tokio::test]
async fn test_redirect_off_host_counts_as_failure() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/moved">Moved</a>"#).await;
    mount_redirect(&server, "/moved", &page_url(&other, "/")).await;
    mount_page(&other, "/", "other host").await;

    let result = crawl(seed_of(&server), &create_test_config())
        .await
        .expect("crawl succeeds");

    assert_eq!(result.links.len(), 1);
    assert_eq!(result.error_count, 1);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("eventually").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        timeout: Duration::from_millis(200),
        ..CrawlerConfig::default()
    };
    let client = build_http_client(&config, &UserAgentConfig::default()).unwrap();

    let url = Url::parse(&page_url(&server, "/slow")).unwrap();
    let err = fetch_page(&client, &url).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }));
}

#[tokio::test]
async fn test_non_200_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/created"))
        .respond_with(ResponseTemplate::new(201).set_body_string("<a href=\"/x\">x</a>"))
        .mount(&server)
        .await;

    let url = Url::parse(&page_url(&server, "/created")).unwrap();
    let err = fetch_page(&test_client(), &url).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 201, .. }));
}

#[tokio::test]
async fn test_crawl_and_write_sitemap() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/about">About</a>"#).await;
    mount_page(&server, "/about", r#"<a href="/">Home</a>"#).await;

    let seed = seed_of(&server);
    let result = crawl(seed.clone(), &create_test_config())
        .await
        .expect("crawl succeeds");

    let path = write_sitemap(&result, temp_dir.path(), &seed).unwrap();
    assert_eq!(path, temp_dir.path().join("127.0.0.1_sitemap.json"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let expected = serde_json::json!({
        format!("{}/", server.uri()): [page_url(&server, "/about")],
        page_url(&server, "/about"): [],
    });
    assert_eq!(written, expected);
}
