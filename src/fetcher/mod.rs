//! HTTP transport, bounded request queue and pagination

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

pub mod diagnostics;
pub mod http;
pub mod pagination;
pub mod queue;
pub mod shared_resources;

pub use http::HttpTransport;
pub use pagination::{PageBody, PageFetch, PaginatedFetcher};
pub use queue::BoundedRequestQueue;

/// Failure of a single HTTP exchange
///
/// Carries whatever the failing layer knew: the HTTP status and the server's
/// inner `message` when a response arrived, otherwise a transport error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request to {url} failed: {reason}")]
pub struct HttpError {
    /// URL of the failing request
    pub url: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Short human readable reason
    pub reason: String,
    /// `message` field of the server's JSON error body
    pub message: Option<String>,
    /// Transport error code (`timeout`, `connect`, `request`, `decode`, `body`)
    pub code: Option<String>,
}

impl HttpError {
    /// Error for a non-success HTTP status
    pub fn from_status(url: impl Into<String>, status: StatusCode, body: &Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            url: url.into(),
            status: Some(status.as_u16()),
            reason: format!(
                "server responded {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
            message,
            code: None,
        }
    }

    /// Error raised before any response was received
    pub fn transport(url: impl Into<String>, code: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            reason: reason.into(),
            message: None,
            code: Some(code.to_string()),
        }
    }
}

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP or transport failure
    #[error(transparent)]
    Http(#[from] HttpError),

    /// URL could not be parsed
    #[error("invalid URL '{url}': {source}")]
    UrlParse {
        /// The offending URL
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Response had an unexpected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// A received HTTP response with a decoded JSON body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers, looked up case-insensitively
    pub headers: HeaderMap,
    /// Decoded JSON body (`Null` for an empty body)
    pub body: Value,
}

impl HttpResponse {
    /// Successful response with empty headers
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Read a header as a base-10 integer
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers
            .get(name)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

/// Body of a POST request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
    /// JSON document
    Json(Value),
}

/// HTTP transport used by every component that talks to the API
///
/// Implementations return `Err` for transport failures and non-success
/// statuses alike.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, HttpError>;

    /// Issue a POST request
    async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: RequestBody,
    ) -> Result<HttpResponse, HttpError>;
}
