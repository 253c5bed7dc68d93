//! First-probe-then-fan-out pagination
//!
//! Page 1 is fetched on its own. Its `X-WP-Total` / `X-WP-TotalPages` headers
//! tell how many more pages exist; pages `2..=N` then go through the
//! [`BoundedRequestQueue`] and are merged back in page order.
//!
//! Every advertised page is requested. A failed page is reported in
//! [`PageFetch::failed_pages`] and skipped.

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::diagnostics::format_failure;
use super::queue::BoundedRequestQueue;
use super::{FetcherError, FetcherResult, HttpError, HttpResponse, Transport};
use crate::metrics;

/// Header carrying the total number of items in a collection
pub const TOTAL_ITEMS_HEADER: &str = "x-wp-total";

/// Header carrying the total number of pages in a collection
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// Body returned by a paginated fetch
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// Items of every fetched page, in page order
    Items(Vec<Value>),
    /// Unpaginated singleton document (e.g. `/wp/v2/types`), passed through as-is
    Document(Value),
}

impl PageBody {
    /// Number of items, counting a document as one
    pub fn len(&self) -> usize {
        match self {
            PageBody::Items(items) => items.len(),
            PageBody::Document(_) => 1,
        }
    }

    /// Whether no items were fetched
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list of values
    pub fn into_values(self) -> Vec<Value> {
        match self {
            PageBody::Items(items) => items,
            PageBody::Document(document) => vec![document],
        }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    /// 1-based page number
    pub page: u64,
    /// What went wrong
    pub error: HttpError,
}

/// Result of fetching every page of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct PageFetch {
    /// Merged body
    pub body: PageBody,
    /// Value of the total-items header, when present
    pub total_items: Option<u64>,
    /// Value of the total-pages header, when present
    pub total_pages: Option<u64>,
    /// Pages whose items are missing from `body`
    pub failed_pages: Vec<PageFailure>,
}

/// Fetches every page of a collection
#[derive(Clone)]
pub struct PaginatedFetcher {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    per_page: u32,
    queue: BoundedRequestQueue,
}

impl PaginatedFetcher {
    /// Create a fetcher.
    ///
    /// # Arguments
    /// * `transport` - HTTP transport
    /// * `headers` - Headers sent with every page request (auth)
    /// * `per_page` - Page size requested from the API
    /// * `queue` - Executor for pages 2..N
    pub fn new(
        transport: Arc<dyn Transport>,
        headers: HeaderMap,
        per_page: u32,
        queue: BoundedRequestQueue,
    ) -> Self {
        Self {
            transport,
            headers,
            per_page,
            queue,
        }
    }

    /// Build the URL of one page, keeping any query the URL already carries
    pub fn page_url(&self, url: &str, page: u64) -> FetcherResult<String> {
        let mut parsed = Url::parse(url).map_err(|source| FetcherError::UrlParse {
            url: url.to_string(),
            source,
        })?;
        parsed
            .query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(parsed.into())
    }

    async fn get_page(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.transport.get(url, &self.headers).await
    }

    /// Fetch every page of the collection at `url`.
    ///
    /// # Errors
    ///
    /// Fails only when `url` is malformed or page 1 cannot be fetched. Later
    /// page failures are recorded in [`PageFetch::failed_pages`].
    pub async fn fetch_all(&self, url: &str) -> FetcherResult<PageFetch> {
        let first = self.get_page(&self.page_url(url, 1)?).await?;

        // Some resources have no paging, e.g. `/types`
        let total_items = first.header_u64(TOTAL_ITEMS_HEADER);
        let total_pages = first.header_u64(TOTAL_PAGES_HEADER);

        let pages = match (total_items, total_pages) {
            (Some(_), Some(pages)) if pages > 1 => pages,
            _ => {
                let body = match first.body {
                    Value::Array(items) => PageBody::Items(items),
                    document => PageBody::Document(document),
                };
                return Ok(PageFetch {
                    body,
                    total_items,
                    total_pages,
                    failed_pages: Vec::new(),
                });
            }
        };

        debug!(
            "Total entities: {} | Pages to be requested: {pages}",
            total_items.unwrap_or_default()
        );

        let mut items = Vec::new();
        append_items(&mut items, first.body);

        // Page 1 is in hand; fan out over pages 2..=pages.
        let requests = (2..=pages)
            .map(|page| self.page_url(url, page).map(|page_url| (page, page_url)))
            .collect::<FetcherResult<Vec<_>>>()?;
        let page_numbers: Vec<u64> = requests.iter().map(|(page, _)| *page).collect();

        let results = self
            .queue
            .run(requests, |(_, page_url)| async move {
                self.get_page(&page_url).await
            })
            .await;

        let mut failed_pages = Vec::new();
        for (page, result) in page_numbers.into_iter().zip(results) {
            match result {
                Ok(response) => append_items(&mut items, response.body),
                Err(error) => {
                    warn!("Page {page} of {url} omitted\n{}", format_failure(&error));
                    metrics::record_page_omitted();
                    failed_pages.push(PageFailure { page, error });
                }
            }
        }

        Ok(PageFetch {
            body: PageBody::Items(items),
            total_items,
            total_pages: Some(pages),
            failed_pages,
        })
    }
}

fn append_items(items: &mut Vec<Value>, body: Value) {
    match body {
        Value::Array(page) => items.extend(page),
        Value::Null => {}
        other => items.push(other),
    }
}
