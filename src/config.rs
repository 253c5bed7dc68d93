//! Run configuration
//!
//! [`HarvestConfig`] is loaded from a JSON file and/or built from CLI flags.
//! Every field except `base_url` has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::AuthConfig;
use crate::routes::filter::validate_patterns;
pub use crate::routes::discovery::RefactoredEntityTypes;

/// Default page size (the WordPress REST API maximum)
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Default number of concurrent page requests
pub const DEFAULT_CONCURRENT_REQUESTS: i64 = 10;

/// Default prefix of every type name
pub const DEFAULT_TYPE_PREFIX: &str = "wordpress__";

/// Largest page size the REST API accepts
const MAX_PER_PAGE: u32 = 100;

/// API root of sites hosted on wordpress.com, without the site segment
const WPCOM_API_ROOT: &str = "https://public-api.wordpress.com/wp/v2/sites";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: String,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: String,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range or malformed
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of one harvest run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Site host and optional path, without protocol (e.g. `blog.example.com`)
    pub base_url: String,
    /// `http` or `https`
    pub protocol: String,
    /// Site is hosted on wordpress.com
    pub hosting_wpcom: bool,
    /// Print a start-of-run banner and per-route decisions
    pub verbose: bool,
    /// Fetch ACF (custom-field plugin) routes and options
    pub use_acf: bool,
    /// ACF option page ids fetched individually (ACF to REST v3 only)
    pub acf_option_page_ids: Vec<String>,
    /// Credentials
    pub auth: AuthConfig,
    /// Page size
    pub per_page: u32,
    /// Concurrent page requests per target; zero or less means one
    pub concurrent_requests: i64,
    /// Include globs
    pub included_routes: Vec<String>,
    /// Exclude globs
    pub excluded_routes: Vec<String>,
    /// Prefix of every type name
    pub type_prefix: String,
    /// Overrides for core post/page/tag/category type names
    pub refactored_entity_types: RefactoredEntityTypes,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            protocol: "https".to_string(),
            hosting_wpcom: false,
            verbose: false,
            use_acf: false,
            acf_option_page_ids: Vec::new(),
            auth: AuthConfig::default(),
            per_page: DEFAULT_PER_PAGE,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            included_routes: vec!["**".to_string()],
            excluded_routes: Vec::new(),
            type_prefix: DEFAULT_TYPE_PREFIX.to_string(),
            refactored_entity_types: RefactoredEntityTypes::default(),
        }
    }
}

impl HarvestConfig {
    /// Default configuration for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Base URL with any protocol and trailing slash removed
    fn host(&self) -> &str {
        let host = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        host.trim_end_matches('/')
    }

    /// Site URL, e.g. `https://blog.example.com`
    pub fn site_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host())
    }

    /// API root URL; differs between self-hosted and wordpress.com sites
    pub fn api_root(&self) -> String {
        if self.hosting_wpcom {
            format!("{WPCOM_API_ROOT}/{}", self.host())
        } else {
            format!("{}/wp-json", self.site_url())
        }
    }

    /// Concurrency limit with zero and negative values clamped to one
    pub fn effective_concurrency(&self) -> usize {
        usize::try_from(self.concurrent_requests)
            .unwrap_or(1)
            .max(1)
    }

    /// Check the configuration before a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }

        if !matches!(self.protocol.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "protocol must be http or https, got '{}'",
                self.protocol
            )));
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::Invalid(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }

        validate_patterns(self.included_routes.iter().chain(&self.excluded_routes))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }
}
