//! Bearer token acquisition
//!
//! Two strategies, chosen by which credentials are configured:
//!
//! - wordpress.com hosting with `wpcom_*` credentials: password-grant OAuth
//!   exchange against the wordpress.com token endpoint
//! - self-hosted with `jwt_user`/`jwt_pass`: login against the JWT
//!   Authentication plugin at `<api root>/jwt-auth/v1/token`
//!
//! Any failure is fatal for the run; no data route is queried without the
//! token the configuration asked for.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::fetcher::{HttpError, RequestBody, Transport};

/// wordpress.com OAuth token endpoint
pub const WPCOM_OAUTH_URL: &str = "https://public-api.wordpress.com/oauth2/token";

/// JWT login route, relative to the API root
const JWT_TOKEN_ROUTE: &str = "/jwt-auth/v1/token";

/// Credentials consumed by the auth strategies
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT Authentication plugin user
    pub jwt_user: Option<String>,
    /// JWT Authentication plugin password
    pub jwt_pass: Option<String>,
    /// wordpress.com application client id
    pub wpcom_app_client_id: Option<String>,
    /// wordpress.com application client secret
    pub wpcom_app_client_secret: Option<String>,
    /// wordpress.com user
    pub wpcom_user: Option<String>,
    /// wordpress.com password
    pub wpcom_pass: Option<String>,
    /// HTTP Basic Auth user
    pub htaccess_user: Option<String>,
    /// HTTP Basic Auth password
    pub htaccess_pass: Option<String>,
}

impl AuthConfig {
    /// Whether JWT credentials are configured
    pub fn uses_jwt(&self) -> bool {
        self.jwt_user.is_some() || self.jwt_pass.is_some()
    }

    /// Whether wordpress.com OAuth credentials are configured
    pub fn uses_wpcom(&self) -> bool {
        self.wpcom_app_client_id.is_some()
            || self.wpcom_app_client_secret.is_some()
            || self.wpcom_user.is_some()
            || self.wpcom_pass.is_some()
    }

    /// Whether HTTP Basic Auth credentials are configured
    pub fn uses_htaccess(&self) -> bool {
        self.htaccess_user.is_some() || self.htaccess_pass.is_some()
    }

    /// Auth settings for verbose output, with passwords masked
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.uses_jwt() {
            lines.push(format!(
                "JWT Auth: {}:{}",
                self.jwt_user.as_deref().unwrap_or_default(),
                mask(self.jwt_pass.as_deref())
            ));
        }
        if self.uses_wpcom() {
            lines.push(format!(
                "wordpress.com OAuth: {}:{}",
                self.wpcom_user.as_deref().unwrap_or_default(),
                mask(self.wpcom_pass.as_deref())
            ));
        }
        if self.uses_htaccess() {
            lines.push(format!(
                "HTTP Basic Auth: {}:{}",
                self.htaccess_user.as_deref().unwrap_or_default(),
                mask(self.htaccess_pass.as_deref())
            ));
        }
        lines
    }
}

fn mask(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "********",
        _ => "",
    }
}

/// Selected authentication strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Password-grant OAuth against wordpress.com
    WordPressCom,
    /// JWT Authentication plugin login
    Jwt,
    /// No bearer token
    Anonymous,
}

impl AuthStrategy {
    /// Pick a strategy from the hosting mode and configured credentials
    pub fn select(auth: &AuthConfig, hosting_wpcom: bool) -> Self {
        if hosting_wpcom {
            if auth.uses_wpcom() {
                AuthStrategy::WordPressCom
            } else {
                AuthStrategy::Anonymous
            }
        } else if auth.uses_jwt() {
            AuthStrategy::Jwt
        } else {
            AuthStrategy::Anonymous
        }
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token exchange request failed
    #[error("{strategy} token exchange failed: {source}")]
    Exchange {
        /// Strategy label
        strategy: &'static str,
        /// Underlying HTTP failure
        #[source]
        source: HttpError,
    },

    /// Exchange succeeded but no token came back
    #[error("{strategy} token exchange returned no '{field}' field")]
    MissingToken {
        /// Strategy label
        strategy: &'static str,
        /// Expected field
        field: &'static str,
    },
}

/// Obtain a bearer token for the run.
///
/// Returns `Ok(None)` when the configuration needs no token.
///
/// # Arguments
/// * `transport` - HTTP transport
/// * `auth` - Configured credentials
/// * `hosting_wpcom` - Site is hosted on wordpress.com
/// * `api_root` - API root URL, used for the JWT login route
/// * `headers` - Base headers (HTTP Basic Auth) sent with the exchange
pub async fn authenticate(
    transport: &dyn Transport,
    auth: &AuthConfig,
    hosting_wpcom: bool,
    api_root: &str,
    headers: &HeaderMap,
) -> Result<Option<String>, AuthError> {
    match AuthStrategy::select(auth, hosting_wpcom) {
        AuthStrategy::Anonymous => {
            debug!("No bearer token configured");
            Ok(None)
        }
        AuthStrategy::WordPressCom => wpcom_access_token(transport, auth, headers).await.map(Some),
        AuthStrategy::Jwt => jwt_token(transport, auth, api_root, headers).await.map(Some),
    }
}

async fn wpcom_access_token(
    transport: &dyn Transport,
    auth: &AuthConfig,
    headers: &HeaderMap,
) -> Result<String, AuthError> {
    const STRATEGY: &str = "wordpress.com OAuth";

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    let form = vec![
        ("client_secret".to_string(), field(&auth.wpcom_app_client_secret)),
        ("client_id".to_string(), field(&auth.wpcom_app_client_id)),
        ("username".to_string(), field(&auth.wpcom_user)),
        ("password".to_string(), field(&auth.wpcom_pass)),
        ("grant_type".to_string(), "password".to_string()),
    ];

    let response = transport
        .post(WPCOM_OAUTH_URL, headers, RequestBody::Form(form))
        .await
        .map_err(|source| AuthError::Exchange {
            strategy: STRATEGY,
            source,
        })?;

    let token = extract_token(&response.body, "access_token").ok_or(AuthError::MissingToken {
        strategy: STRATEGY,
        field: "access_token",
    })?;
    info!("Obtained wordpress.com access token");
    Ok(token)
}

async fn jwt_token(
    transport: &dyn Transport,
    auth: &AuthConfig,
    api_root: &str,
    headers: &HeaderMap,
) -> Result<String, AuthError> {
    const STRATEGY: &str = "JWT";

    let url = format!("{}{JWT_TOKEN_ROUTE}", api_root.trim_end_matches('/'));
    let body = json!({
        "username": auth.jwt_user.as_deref().unwrap_or_default(),
        "password": auth.jwt_pass.as_deref().unwrap_or_default(),
    });

    let response = transport
        .post(&url, headers, RequestBody::Json(body))
        .await
        .map_err(|source| AuthError::Exchange {
            strategy: STRATEGY,
            source,
        })?;

    let token = extract_token(&response.body, "token").ok_or(AuthError::MissingToken {
        strategy: STRATEGY,
        field: "token",
    })?;
    info!("Obtained JWT token");
    Ok(token)
}

fn extract_token(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
