//! Immutable per-run request context
//!
//! Built once per run: first with the HTTP Basic credentials (needed by the
//! token exchange itself), then with the bearer token. Every component that
//! issues requests receives it by reference.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;

use super::{HarvestError, HarvestResult};
use crate::auth::AuthConfig;
use crate::fetcher::Transport;

/// Transport plus the headers sent with every API request
#[derive(Clone)]
pub struct RequestContext {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    has_bearer: bool,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("header_count", &self.headers.len())
            .field("has_bearer", &self.has_bearer)
            .finish()
    }
}

impl RequestContext {
    /// Context carrying HTTP Basic credentials when configured
    pub fn new(transport: Arc<dyn Transport>, auth: &AuthConfig) -> HarvestResult<Self> {
        let mut headers = HeaderMap::new();

        if auth.uses_htaccess() {
            let credentials = format!(
                "{}:{}",
                auth.htaccess_user.as_deref().unwrap_or_default(),
                auth.htaccess_pass.as_deref().unwrap_or_default()
            );
            let value = format!("Basic {}", STANDARD.encode(credentials));
            headers.insert(AUTHORIZATION, sensitive(&value)?);
        }

        Ok(Self {
            transport,
            headers,
            has_bearer: false,
        })
    }

    /// Derive a context carrying `token` as a bearer token.
    ///
    /// The bearer token replaces any Basic credentials in `Authorization`.
    pub fn with_bearer(&self, token: Option<&str>) -> HarvestResult<Self> {
        let Some(token) = token else {
            return Ok(self.clone());
        };

        let mut headers = self.headers.clone();
        headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);

        Ok(Self {
            transport: self.transport.clone(),
            headers,
            has_bearer: true,
        })
    }

    /// Shared transport
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether a bearer token is attached
    pub fn has_bearer(&self) -> bool {
        self.has_bearer
    }
}

fn sensitive(value: &str) -> HarvestResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| HarvestError::InvalidCredentials(e.to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}
