//! Failure classification and user-facing diagnostics
//!
//! Every failed request is reported with the failing path, then either the
//! HTTP status (plus the server's inner message when it sent one) or the raw
//! transport error code.

use reqwest::Error as ReqwestError;
use url::Url;

use super::HttpError;

/// Classification of request failures for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// Body could not be read or decoded as JSON
    MalformedBody,
    /// HTTP 401/403
    AuthFailed(u16),
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// Other HTTP 4xx
    ClientError(u16),
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl FailureKind {
    /// User-friendly description
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::MalformedBody => "response was not valid JSON",
            Self::AuthFailed(401) => "authentication failed (401)",
            Self::AuthFailed(403) => "access forbidden (403)",
            Self::AuthFailed(_) => "authentication failed",
            Self::NotFound => "resource not found",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(_) => "client error",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check your network connection or lower concurrent_requests",
            Self::NetworkOffline => "Verify the base URL, internet connectivity and DNS resolution",
            Self::MalformedBody => "A plugin or proxy may be injecting HTML into the REST API output",
            Self::AuthFailed(_) => "Verify the configured credentials and the user's capabilities",
            Self::NotFound => "The route may need pretty permalinks or be disabled on this site",
            Self::RateLimit => "Lower concurrent_requests or per_page and try again",
            Self::ServerError(_) => "The site may be overloaded; try a smaller per_page",
            Self::ClientError(_) => "Review the request parameters for this route",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }
}

/// Classify an [`HttpError`]
pub fn classify(err: &HttpError) -> FailureKind {
    if let Some(status) = err.status {
        return match status {
            401 | 403 => FailureKind::AuthFailed(status),
            404 => FailureKind::NotFound,
            429 => FailureKind::RateLimit,
            500..=599 => FailureKind::ServerError(status),
            _ => FailureKind::ClientError(status),
        };
    }

    match err.code.as_deref() {
        Some("timeout") => FailureKind::NetworkTimeout,
        Some("connect") => FailureKind::NetworkOffline,
        Some("decode") | Some("body") => FailureKind::MalformedBody,
        _ => FailureKind::NetworkGeneric,
    }
}

/// Short error code for a reqwest failure
pub fn transport_error_code(err: &ReqwestError) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_decode() {
        "decode"
    } else if err.is_body() {
        "body"
    } else if err.is_builder() {
        "builder"
    } else {
        "request"
    }
}

/// Path and query of the failing URL, or the URL itself when unparsable
pub fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Multi-line diagnostic for a failed request
pub fn format_failure(err: &HttpError) -> String {
    let mut lines = vec![format!("Path: {}", request_path(&err.url))];

    match err.status {
        Some(_) => {
            lines.push(format!("The {}", err.reason));
            if let Some(message) = &err.message {
                lines.push(format!("Inner exception message: \"{message}\""));
            }
        }
        None => {
            let code = err.code.as_deref().unwrap_or("unknown");
            lines.push(format!("The request failed with error code \"{code}\""));
            lines.push(format!("  Detail: {}", err.reason));
        }
    }

    let kind = classify(err);
    lines.push(format!("  Cause: {}", kind.description()));
    lines.push(format!("  Suggestion: {}", kind.suggestion()));
    lines.join("\n")
}
