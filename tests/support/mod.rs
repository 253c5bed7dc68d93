//! Shared fixtures for the integration tests

use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_rest_harvester::config::HarvestConfig;
use wp_rest_harvester::fetcher::shared_resources::build_http_client;
use wp_rest_harvester::fetcher::HttpTransport;
use wp_rest_harvester::harvest::Harvester;

/// Route descriptor advertised in the root document
pub fn route(namespace: &str) -> Value {
    json!({"namespace": namespace, "methods": ["GET"], "_links": {"self": "x"}})
}

/// Root document with the given route map
pub fn root_document(routes: Value) -> Value {
    json!({
        "name": "Test Blog",
        "description": "Just another WordPress site",
        "url": "http://blog.test",
        "home": "http://blog.test",
        "namespaces": ["wp/v2", "wp-api-menus/v2"],
        "routes": routes,
    })
}

/// Serve `document` at `/wp-json`
pub async fn mount_root(server: &MockServer, document: Value) {
    Mock::given(method("GET"))
        .and(path("/wp-json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

/// Serve one page of a paginated collection
pub async fn mount_page(
    server: &MockServer,
    route: &str,
    page: u64,
    total_items: u64,
    total_pages: u64,
    items: Value,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-Total", total_items.to_string().as_str())
                .insert_header("X-WP-TotalPages", total_pages.to_string().as_str())
                .set_body_json(items),
        )
        .mount(server)
        .await;
}

/// Serve an unpaginated body at `route`, whatever the query
pub async fn mount_document(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Configuration pointing at the mock server
pub fn config_for(server: &MockServer) -> HarvestConfig {
    let mut config = HarvestConfig::new(server.uri());
    config.protocol = "http".to_string();
    config.per_page = 2;
    config.concurrent_requests = 2;
    config
}

/// Harvester on a fresh client, so pooled connections never outlive a test runtime
pub fn harvester(config: HarvestConfig) -> Harvester {
    let client = build_http_client().expect("client builds");
    Harvester::new(config).with_transport(Arc::new(HttpTransport::new(client)))
}
