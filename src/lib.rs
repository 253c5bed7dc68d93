//! # WordPress REST Harvester Library
//!
//! Discovers the collections a WordPress REST API advertises, filters them
//! against include/exclude globs, and fetches every page of every collection
//! with bounded request concurrency. The result is a flat list of [`Record`]s,
//! each tagged with the type name of the route it came from.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wp_rest_harvester::config::HarvestConfig;
//! use wp_rest_harvester::harvest::Harvester;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::new("blog.example.com");
//! let outcome = Harvester::new(config).run().await?;
//! println!("fetched {} records", outcome.records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`routes`] - Route classification, glob filtering and discovery of fetch targets
//! - [`fetcher`] - HTTP transport, bounded request queue and pagination
//! - [`auth`] - Bearer token acquisition (wordpress.com OAuth or JWT)
//! - [`harvest`] - Run orchestration and child-collection expansion
//! - [`config`] - Run configuration with defaults and validation
//! - [`output`] - Record writers (JSON, NDJSON)
//! - [`metrics`] - Request and record counters
//!
//! ## Records
//!
//! A [`Record`] is an arbitrary JSON object plus two reserved fields kept out
//! of the generic map: the type name (`__type`) and, for ACF option pages, the
//! option page id (`__optionPageId`).

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Bearer token acquisition
pub mod auth;

/// CLI command implementations
pub mod cli;

/// Run configuration
pub mod config;

/// HTTP transport, request queue and pagination
pub mod fetcher;

/// Run orchestration
pub mod harvest;

/// Metrics facade helpers
pub mod metrics;

/// Record writers
pub mod output;

/// Route classification, filtering and discovery
pub mod routes;

/// Serialized key carrying a record's type name
pub const TYPE_KEY: &str = "__type";

/// Serialized key carrying a record's ACF option page id
pub const OPTION_PAGE_ID_KEY: &str = "__optionPageId";

/// A concrete, filtered, URL-resolved route selected for retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTarget {
    /// Absolute URL of the collection
    pub url: String,
    /// Type name given to every record fetched from this target
    #[serde(rename = "type")]
    pub type_name: String,
    /// ACF option page id, only set for per-page option targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_page_id: Option<String>,
}

impl FetchTarget {
    /// Create a target without an option page id
    pub fn new(url: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            type_name: type_name.into(),
            option_page_id: None,
        }
    }

    /// Attach an ACF option page id
    pub fn with_option_page_id(mut self, id: impl Into<String>) -> Self {
        self.option_page_id = Some(id.into());
        self
    }
}

/// One fetched item, tagged with the type of the route it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Type name (`__type` once serialized)
    pub type_name: String,
    /// ACF option page id (`__optionPageId` once serialized)
    pub option_page_id: Option<String>,
    /// Every other field of the fetched object
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object.
    ///
    /// Reserved keys already present in `fields` are dropped so they cannot
    /// shadow the typed fields on serialization.
    pub fn new(type_name: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.shift_remove(TYPE_KEY);
        fields.shift_remove(OPTION_PAGE_ID_KEY);
        Self {
            type_name: type_name.into(),
            option_page_id: None,
            fields,
        }
    }

    /// Build a record from any JSON value.
    ///
    /// Returns `None` when the value is not an object.
    pub fn from_value(type_name: &str, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(type_name, fields)),
            _ => None,
        }
    }

    /// Attach an ACF option page id
    pub fn with_option_page_id(mut self, id: Option<String>) -> Self {
        self.option_page_id = id;
        self
    }

    /// Look up a field of the fetched object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Follow a path of object keys, e.g. `["meta", "links", "self"]`
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = if self.option_page_id.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(id) = &self.option_page_id {
            map.serialize_entry(OPTION_PAGE_ID_KEY, id)?;
        }
        map.serialize_entry(TYPE_KEY, &self.type_name)?;
        map.end()
    }
}
