//! reqwest-backed [`Transport`]
//!
//! Every response body is decoded as JSON. Non-success statuses are turned
//! into [`HttpError`]s that keep the server's inner `message`, transport
//! failures into [`HttpError`]s tagged with a short error code.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::diagnostics::transport_error_code;
use super::shared_resources::global_http_client;
use super::{HttpError, HttpResponse, RequestBody, Transport};
use crate::metrics;

/// HTTP transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Transport on the process-wide pooled client
    pub fn shared() -> Result<Self, HttpError> {
        global_http_client()
            .map(Self::new)
            .map_err(|e| HttpError::transport("", transport_error_code(&e), e.to_string()))
    }

    async fn execute(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<HttpResponse, HttpError> {
        metrics::record_request(method);
        debug!("{method} {url}");

        let result = self.send(url, request).await;
        if result.is_err() {
            metrics::record_http_failure(method);
        }
        result
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<HttpResponse, HttpError> {
        let response = request
            .send()
            .await
            .map_err(|e| HttpError::transport(url, transport_error_code(&e), e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::transport(url, "body", e.to_string()))?;

        let body = decode_body(&text);

        if !status.is_success() {
            return Err(HttpError::from_status(
                url,
                status,
                body.as_ref().unwrap_or(&Value::Null),
            ));
        }

        let body = body.map_err(|e| {
            HttpError::transport(url, "decode", format!("Failed to deserialize response: {e}"))
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn decode_body(text: &str) -> serde_json::Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, HttpError> {
        let request = self.client.get(url).headers(headers.clone());
        self.execute("GET", url, request).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: RequestBody,
    ) -> Result<HttpResponse, HttpError> {
        let request = self.client.post(url).headers(headers.clone());
        let request = match body {
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::Json(value) => request.json(&value),
        };
        self.execute("POST", url, request).await
    }
}
