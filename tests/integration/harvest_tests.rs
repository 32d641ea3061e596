//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the classifieds site and drive
//! fetching, pagination, fan-out and aggregation end-to-end.

use biturbo_harvester::config::{Config, FetchConfig, HarvestConfig, OutputConfig};
use biturbo_harvester::crawler::{
    build_http_client, FetchError, Fetcher, Harvester, IndexPaginator, RetryPolicy,
    BROWSER_USER_AGENT,
};
use biturbo_harvester::output::{load_records, write_csv};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, start_page: u32, end_page: u32, max_concurrent: u32) -> Config {
    Config {
        harvest: HarvestConfig {
            site_url: base_url.to_string(),
            index_url: format!("{}/az/axtar", base_url),
            start_page,
            end_page,
            max_concurrent,
            max_listings_per_page: None,
            page_delay_ms: 0,
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            connect_timeout_secs: 1,
            max_retries: 3,
            backoff_base_ms: 1,
        },
        output: OutputConfig {
            csv_path: "unused.csv".to_string(),
        },
    }
}

fn test_fetcher(max_attempts: u32, base: Duration) -> Fetcher {
    let client = build_http_client(&FetchConfig::default()).expect("Failed to build client");
    Fetcher::with_client(client, RetryPolicy::new(max_attempts, base))
}

fn index_page(links: &[&str]) -> String {
    let cards: String = links
        .iter()
        .map(|href| {
            format!(
                r#"<div class="products-i"><a class="products-i-link" href="{}"><div class="products-name">Car</div></a></div>"#,
                href
            )
        })
        .collect();
    format!("<html><body><div class=\"products\">{}</div></body></html>", cards)
}

fn detail_page(id: &str, brand: &str, price: &str, year: &str) -> String {
    format!(
        r#"<html><body>
        <h2 class="product-name">{brand} listing {id}</h2>
        <div class="product-price">{price} AZN</div>
        <div class="product-statistics">
            <p>Baxışların sayı: 42</p>
            <p>Elanın nömrəsi: {id}</p>
        </div>
        <ul class="product-properties">
            <li class="product-properties-i"><label>Marka</label><div class="product-properties-value">{brand}</div></li>
            <li class="product-properties-i"><label>Buraxılış ili</label><div class="product-properties-value">{year}</div></li>
        </ul>
        </body></html>"#,
        brand = brand,
        id = id,
        price = price,
        year = year
    )
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_listings_then_empty_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/az/axtar/",
        index_page(&["/az/elan/1-bmw", "/az/elan/2-kia"]),
    )
    .await;
    mount_html(&mock_server, "/az/axtar/2/", index_page(&[])).await;
    mount_html(
        &mock_server,
        "/az/elan/1-bmw",
        detail_page("1", "BMW", "45 000", "2018, benzin"),
    )
    .await;
    mount_html(
        &mock_server,
        "/az/elan/2-kia",
        detail_page("2", "Kia", "18 500", "2015"),
    )
    .await;

    let config = create_test_config(&base_url, 1, 2, 10);
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest failed");

    assert_eq!(report.urls_discovered, 2);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failures, 0);

    let mut records = report.records.clone();
    records.sort_by(|a, b| a.listing_id.cmp(&b.listing_id));

    assert_eq!(records[0].url, format!("{}/az/elan/1-bmw", base_url));
    assert_eq!(records[0].brand, "BMW");
    assert_eq!(records[0].price, "45000");
    assert_eq!(records[0].year, "2018");
    assert_eq!(records[0].views, "42");
    assert_eq!(records[0].currency, "AZN");
    assert_eq!(records[0].color, "");

    assert_eq!(records[1].url, format!("{}/az/elan/2-kia", base_url));
    assert_eq!(records[1].price, "18500");
    assert_eq!(records[1].year, "2015");
}

#[tokio::test]
async fn test_paginator_collects_in_page_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/az/axtar/", index_page(&["/az/elan/a", "/az/elan/b"])).await;
    mount_html(&mock_server, "/az/axtar/2/", index_page(&[])).await;
    mount_html(&mock_server, "/az/axtar/3/", index_page(&["/az/elan/c"])).await;

    let config = create_test_config(&base_url, 1, 3, 10);
    let paginator = IndexPaginator::new(test_fetcher(1, Duration::from_millis(1)), &config.harvest)
        .expect("Failed to create paginator");

    let urls = paginator.collect_urls(1, 3, None).await;
    assert_eq!(
        urls,
        vec![
            format!("{}/az/elan/a", base_url),
            format!("{}/az/elan/b", base_url),
            format!("{}/az/elan/c", base_url),
        ]
    );
}

#[tokio::test]
async fn test_empty_index_page_returns_no_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/az/axtar/", index_page(&[])).await;

    let config = create_test_config(&base_url, 1, 1, 10);
    let paginator = IndexPaginator::new(test_fetcher(1, Duration::from_millis(1)), &config.harvest)
        .expect("Failed to create paginator");

    let urls = paginator
        .list_detail_urls(&format!("{}/az/axtar/", base_url))
        .await;
    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_per_page_cap_and_duplicates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/az/axtar/",
        index_page(&["/az/elan/1", "/az/elan/2", "/az/elan/3"]),
    )
    .await;
    mount_html(
        &mock_server,
        "/az/axtar/2/",
        index_page(&["/az/elan/2", "/az/elan/4", "/az/elan/5"]),
    )
    .await;

    let config = create_test_config(&base_url, 1, 2, 10);
    let paginator = IndexPaginator::new(test_fetcher(1, Duration::from_millis(1)), &config.harvest)
        .expect("Failed to create paginator");

    let urls = paginator.collect_urls(1, 2, Some(2)).await;
    assert_eq!(
        urls,
        vec![
            format!("{}/az/elan/1", base_url),
            format!("{}/az/elan/2", base_url),
            format!("{}/az/elan/2", base_url),
            format!("{}/az/elan/4", base_url),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_index_yields_empty_result() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/az/axtar/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 1, 1, 10);
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest should not fail");

    assert_eq!(report.urls_discovered, 0);
    assert!(report.records.is_empty());
    assert_eq!(report.failures, 0);
}

/// Fails the first `failures` requests with a 500, then serves a page,
/// recording when each request arrived
struct FlakyResponder {
    failures: usize,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().expect("arrivals lock poisoned");
        arrivals.push(Instant::now());
        if arrivals.len() <= self.failures {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>")
        }
    }
}

#[tokio::test]
async fn test_retry_then_success() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(FlakyResponder {
            failures: 2,
            arrivals: Arc::clone(&arrivals),
        })
        .mount(&mock_server)
        .await;

    let base = Duration::from_millis(100);
    let fetcher = test_fetcher(3, base);
    let page = fetcher
        .fetch(&format!("{}/flaky", mock_server.uri()))
        .await
        .expect("Fetch should succeed on the third attempt");

    assert_eq!(page.attempts, 3);
    assert_eq!(page.status_code, 200);
    assert!(page.body.contains("ok"));

    let arrivals = arrivals.lock().expect("arrivals lock poisoned").clone();
    assert_eq!(arrivals.len(), 3);

    // Waits between attempts double: base, then 2 * base
    let first_gap = arrivals[1] - arrivals[0];
    let second_gap = arrivals[2] - arrivals[1];
    assert!(first_gap >= base, "first wait {:?} < {:?}", first_gap, base);
    assert!(
        second_gap >= base * 2,
        "second wait {:?} < {:?}",
        second_gap,
        base * 2
    );
    assert!(
        second_gap > first_gap,
        "waits did not grow: {:?} then {:?}",
        first_gap,
        second_gap
    );
}

#[tokio::test]
async fn test_single_failure_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/once", "<p>fine</p>".to_string()).await;

    let fetcher = test_fetcher(3, Duration::from_millis(1));
    let page = fetcher
        .fetch(&format!("{}/once", mock_server.uri()))
        .await
        .expect("Fetch should succeed on the second attempt");
    assert_eq!(page.attempts, 2);
}

#[tokio::test]
async fn test_exhaustion_makes_exactly_max_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3, Duration::from_millis(1));
    let url = format!("{}/down", mock_server.uri());
    let result = fetcher.fetch(&url).await;

    match result {
        Err(FetchError::Exhausted {
            url: failed,
            attempts,
            last,
        }) => {
            assert_eq!(failed, url);
            assert_eq!(attempts, 3);
            assert!(last.contains("500"));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
}

/// Accepts one connection, answers it with a small page and returns the raw
/// request head as received on the wire
async fn capture_request_head() -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Listener has no address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        while !received.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("Failed to read request");
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
            .await
            .expect("Failed to write response");
        String::from_utf8_lossy(&received).into_owned()
    });

    (format!("http://{}/headers", addr), handle)
}

/// Header lines of a raw request head, keyed by lowercase name
fn parse_header_lines(head: &str) -> HashMap<String, String> {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let (url, server) = capture_request_head().await;

    let fetcher = Fetcher::new(&FetchConfig::default()).expect("Failed to create fetcher");
    let page = fetcher.fetch(&url).await.expect("Fetch should succeed");
    assert_eq!(page.attempts, 1);
    assert_eq!(page.body, "ok");

    let head = server.await.expect("Capture task failed");
    let headers = parse_header_lines(&head);

    assert_eq!(headers.get("user-agent").map(String::as_str), Some(BROWSER_USER_AGENT));
    assert_eq!(
        headers.get("accept").map(String::as_str),
        Some("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
    );
    assert_eq!(
        headers.get("accept-language").map(String::as_str),
        Some("en-US,en;q=0.5")
    );
    assert_eq!(
        headers.get("accept-encoding").map(String::as_str),
        Some("gzip, deflate")
    );
    assert_eq!(
        headers.get("connection").map(|v| v.to_ascii_lowercase()),
        Some("keep-alive".to_string())
    );
    assert_eq!(
        headers.get("upgrade-insecure-requests").map(String::as_str),
        Some("1")
    );
}

#[tokio::test]
async fn test_concurrency_bound_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (1..=12).map(|i| format!("/az/elan/{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_html(&mock_server, "/az/axtar/", index_page(&link_refs)).await;

    for (i, link) in links.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(link.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(&(i + 1).to_string(), "Toyota", "10 000", "2010"))
                    .set_delay(Duration::from_millis(100)),
            )
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&base_url, 1, 1, 3);
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest failed");

    assert_eq!(report.records.len(), 12);
    assert!(
        report.peak_in_flight <= 3,
        "peak in flight {} exceeded the limit",
        report.peak_in_flight
    );
    assert!(report.peak_in_flight >= 2, "fan-out should overlap fetches");
    assert_eq!(harvester.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_failed_listing_does_not_affect_siblings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/az/axtar/",
        index_page(&["/az/elan/1", "/az/elan/gone", "/az/elan/3", "/az/elan/empty"]),
    )
    .await;
    mount_html(&mock_server, "/az/elan/1", detail_page("1", "Audi", "30 000", "2017")).await;
    mount_html(&mock_server, "/az/elan/3", detail_page("3", "Opel", "9 000", "2009")).await;
    Mock::given(method("GET"))
        .and(path("/az/elan/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/az/elan/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 1, 1, 2);
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest failed");

    assert_eq!(report.urls_discovered, 4);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.parse_failures, 1);
    assert_eq!(report.task_failures, 0);

    let ids: HashSet<_> = report.records.iter().map(|r| r.listing_id.as_str()).collect();
    assert_eq!(ids, HashSet::from(["1", "3"]));
}

#[tokio::test]
async fn test_duplicate_urls_produce_duplicate_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/az/axtar/", index_page(&["/az/elan/7"])).await;
    mount_html(&mock_server, "/az/axtar/2/", index_page(&["/az/elan/7"])).await;
    mount_html(&mock_server, "/az/elan/7", detail_page("7", "Lada", "5 500", "2005")).await;

    let config = create_test_config(&base_url, 1, 2, 10);
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest failed");

    assert_eq!(report.urls_discovered, 2);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0], report.records[1]);
}

#[tokio::test]
async fn test_harvest_to_table() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/az/axtar/", index_page(&["/az/elan/1", "/az/elan/2"])).await;
    mount_html(&mock_server, "/az/elan/1", detail_page("1", "BMW", "45 000", "2018")).await;
    mount_html(&mock_server, "/az/elan/2", detail_page("2", "Kia", "18 500", "2015")).await;

    let config = create_test_config(&base_url, 1, 1, 10);
    let records = biturbo_harvester::harvest(config).await.expect("Harvest failed");

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let table = dir.path().join("listings.csv");
    let written = write_csv(&records, &table).expect("Failed to write table");
    assert_eq!(written, 2);

    let loaded = load_records(&table).expect("Failed to read table");
    assert_eq!(loaded.len(), 2);
    let prices: HashSet<_> = loaded.iter().map(|r| r.price.as_str()).collect();
    assert_eq!(prices, HashSet::from(["45000", "18500"]));
}
