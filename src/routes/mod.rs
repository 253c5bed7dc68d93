//! Route classification, filtering and discovery
//!
//! Turns the root document of a WordPress REST API into an ordered list of
//! [`FetchTarget`](crate::FetchTarget)s:
//!
//! 1. [`classify`] derives the route path, manufacturer and raw entity type
//! 2. [`filter`] decides validity against include/exclude globs
//! 3. [`discovery`] walks the root document and composes type names

pub mod classify;
pub mod discovery;
pub mod filter;

pub use discovery::{discover_targets, DiscoveryOptions, RootDocument, RouteDescriptor};
pub use filter::{RouteFilter, BUILT_IN_EXCLUDES};

/// Route errors
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Base URL could not be parsed
    #[error("invalid base URL '{url}': {source}")]
    UrlParse {
        /// The offending URL
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// A glob in the include or exclude list is malformed
    #[error("invalid route pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Glob compiler message
        message: String,
    },
}

/// Result type for route operations
pub type RouteResult<T> = Result<T, RouteError>;
