//! Shared HTTP client for every transport instance
//!
//! `reqwest::Client` pools connections internally. Sharing one instance keeps
//! page requests of the same run on warm connections to the API host.

use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

static GLOBAL_HTTP_CLIENT: OnceCell<Client> = OnceCell::new();

/// Build a client with the crate's timeouts and user agent
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("wp-rest-harvester/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Get the global HTTP client, building it on first use.
///
/// Returns a clone, which is cheap (the client is reference counted).
pub fn global_http_client() -> reqwest::Result<Client> {
    GLOBAL_HTTP_CLIENT.get_or_try_init(build_http_client).cloned()
}
