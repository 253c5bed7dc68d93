//! Page merge order and concurrency against an in-memory transport

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wp_rest_harvester::fetcher::pagination::{TOTAL_ITEMS_HEADER, TOTAL_PAGES_HEADER};
use wp_rest_harvester::fetcher::{
    BoundedRequestQueue, HttpError, HttpResponse, PageBody, PaginatedFetcher, Transport,
};
use wp_rest_harvester::fetcher::RequestBody;

/// Transport serving canned pages after a per-page delay
struct DelayedPages {
    pages: HashMap<u64, (Duration, Result<Value, u16>)>,
    total_items: u64,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requested: Mutex<Vec<u64>>,
}

impl DelayedPages {
    fn new(total_items: u64) -> Self {
        Self {
            pages: HashMap::new(),
            total_items,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn page(mut self, page: u64, delay_ms: u64, body: Value) -> Self {
        self.pages.insert(page, (Duration::from_millis(delay_ms), Ok(body)));
        self
    }

    fn failing_page(mut self, page: u64, delay_ms: u64, status: u16) -> Self {
        self.pages.insert(page, (Duration::from_millis(delay_ms), Err(status)));
        self
    }

    fn page_number(url: &str) -> u64 {
        url::Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "page")
            .map(|(_, v)| v.parse().unwrap())
            .unwrap()
    }
}

#[async_trait]
impl Transport for DelayedPages {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> Result<HttpResponse, HttpError> {
        let page = Self::page_number(url);
        self.requested.lock().unwrap().push(page);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (delay, body) = self.pages.get(&page).cloned().unwrap();
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match body {
            Ok(body) => {
                let mut response = HttpResponse::ok(body);
                response.headers.insert(
                    TOTAL_ITEMS_HEADER,
                    HeaderValue::from_str(&self.total_items.to_string()).unwrap(),
                );
                response.headers.insert(
                    TOTAL_PAGES_HEADER,
                    HeaderValue::from_str(&self.pages.len().to_string()).unwrap(),
                );
                Ok(response)
            }
            Err(status) => Err(HttpError::from_status(
                url,
                reqwest::StatusCode::from_u16(status).unwrap(),
                &json!({"message": "boom"}),
            )),
        }
    }

    async fn post(&self, url: &str, _headers: &HeaderMap, _body: RequestBody) -> Result<HttpResponse, HttpError> {
        Err(HttpError::transport(url, "request", "not supported"))
    }
}

fn fetcher(transport: Arc<DelayedPages>, limit: usize) -> PaginatedFetcher {
    PaginatedFetcher::new(transport, HeaderMap::new(), 2, BoundedRequestQueue::new(limit))
}

#[tokio::test(start_paused = true)]
async fn test_later_page_finishing_first_keeps_page_order() {
    let transport = Arc::new(
        DelayedPages::new(6)
            .page(1, 10, json!(["A", "B"]))
            .page(2, 300, json!(["C", "D"]))
            .page(3, 20, json!(["E", "F"])),
    );

    let fetched = fetcher(transport, 4).fetch_all("https://blog.test/wp/v2/posts").await.unwrap();

    assert_eq!(
        fetched.body,
        PageBody::Items(vec![json!("A"), json!("B"), json!("C"), json!("D"), json!("E"), json!("F")])
    );
    assert_eq!(fetched.total_pages, Some(3));
    assert!(fetched.failed_pages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_one_failed_page_of_five() {
    let transport = Arc::new(
        DelayedPages::new(10)
            .page(1, 5, json!([1, 2]))
            .page(2, 40, json!([3, 4]))
            .failing_page(3, 10, 502)
            .page(4, 5, json!([7, 8]))
            .page(5, 30, json!([9, 10])),
    );

    let fetched = fetcher(transport, 2).fetch_all("https://blog.test/wp/v2/posts").await.unwrap();

    assert_eq!(fetched.body.into_values(), (1..=10).filter(|n| *n != 5 && *n != 6).map(|n| json!(n)).collect::<Vec<_>>());
    assert_eq!(fetched.failed_pages.len(), 1);
    assert_eq!(fetched.failed_pages[0].page, 3);
    assert_eq!(fetched.failed_pages[0].error.status, Some(502));
}

#[tokio::test(start_paused = true)]
async fn test_page_requests_respect_concurrency_limit() {
    let mut transport = DelayedPages::new(20).page(1, 1, json!([0, 0]));
    for page in 2..=10 {
        transport = transport.page(page, 10 * (11 - page), json!([page, page]));
    }
    let transport = Arc::new(transport);

    let fetched = fetcher(transport.clone(), 3)
        .fetch_all("https://blog.test/wp/v2/posts")
        .await
        .unwrap();

    assert_eq!(fetched.body.len(), 20);
    assert!(transport.peak.load(Ordering::SeqCst) <= 3);
    // Page 1 is always requested alone, before the fan-out
    assert_eq!(transport.requested.lock().unwrap()[0], 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_page_failure_fails_the_fetch() {
    let transport = Arc::new(DelayedPages::new(4).failing_page(1, 5, 404).page(2, 5, json!([])));

    let err = fetcher(transport.clone(), 2)
        .fetch_all("https://blog.test/wp/v2/posts")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("404"));
    assert_eq!(*transport.requested.lock().unwrap(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_every_advertised_page_is_requested() {
    const PAGES: u64 = 10_001;
    let mut transport = DelayedPages::new(PAGES);
    for page in 1..=PAGES {
        transport = transport.page(page, 0, json!([page]));
    }
    let transport = Arc::new(transport);

    let fetched = fetcher(transport.clone(), 32)
        .fetch_all("https://blog.test/wp/v2/posts")
        .await
        .unwrap();

    assert_eq!(fetched.total_pages, Some(PAGES));
    assert!(fetched.failed_pages.is_empty());
    let values = fetched.body.into_values();
    assert_eq!(values.len() as u64, PAGES);
    assert_eq!(values.last(), Some(&json!(PAGES)));
    assert_eq!(transport.requested.lock().unwrap().iter().max(), Some(&PAGES));
}
