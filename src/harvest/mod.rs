//! Run orchestration: auth, root document, discovery and per-target fetches

pub mod context;
pub mod expansion;
pub mod orchestrator;
pub mod report;

pub use context::RequestContext;
pub use expansion::{ChildCollection, ExpansionTable};
pub use orchestrator::{HarvestOutcome, Harvester, ProgressCallback};
pub use report::{HarvestSummary, TargetReport};

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::fetcher::HttpError;
use crate::routes::RouteError;

/// Errors that abort a whole run
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Configuration rejected before any request
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Token exchange failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// HTTP client could not be built
    #[error("failed to set up HTTP transport: {0}")]
    Setup(String),

    /// Credentials cannot be sent as a header value
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Root document could not be fetched
    #[error("failed to fetch the API root document: {0}")]
    RootDocument(#[source] HttpError),

    /// Root document is not a REST API index
    #[error("invalid API root document: {0}")]
    InvalidRootDocument(String),

    /// Discovery failed (malformed API root or glob)
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Result type for run operations
pub type HarvestResult<T> = Result<T, HarvestError>;
