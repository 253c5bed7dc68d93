//! Child collections embedded in parent records
//!
//! Some records point at a further collection that is not advertised in the
//! root document, e.g. a WP API Menus menu links to its own items. Each
//! relationship is one [`ChildCollection`] entry: the parent type, the suffix
//! of the child type, and a function pulling the child URL out of a record.

use crate::{FetchTarget, Record};

/// Type of WP API Menus menus, without the type prefix
pub const MENUS_TYPE: &str = "wp_api_menus_menus";

/// Suffix appended to a parent type to name its child collection
pub const ITEMS_SUFFIX: &str = "_items";

/// Pulls the child collection URL out of a parent record
pub type ChildUrlExtractor = fn(&Record) -> Option<String>;

/// One parent-to-child relationship
#[derive(Debug, Clone)]
pub struct ChildCollection {
    /// Type of the records carrying the link
    pub parent_type: String,
    /// Appended to the parent type to form the child type
    pub child_suffix: &'static str,
    /// Link extractor
    pub extract: ChildUrlExtractor,
}

impl ChildCollection {
    /// Child target for `record`, if the record carries a link
    pub fn target_for(&self, record: &Record) -> Option<FetchTarget> {
        let url = (self.extract)(record)?;
        Some(FetchTarget::new(
            url,
            format!("{}{}", record.type_name, self.child_suffix),
        ))
    }
}

/// Table of every known parent-to-child relationship
#[derive(Debug, Clone, Default)]
pub struct ExpansionTable {
    entries: Vec<ChildCollection>,
}

impl ExpansionTable {
    /// Table with no relationships
    pub fn empty() -> Self {
        Self::default()
    }

    /// Relationships of a stock WordPress install with `type_prefix`
    pub fn wordpress(type_prefix: &str) -> Self {
        Self::empty().with_entry(ChildCollection {
            parent_type: format!("{type_prefix}{MENUS_TYPE}"),
            child_suffix: ITEMS_SUFFIX,
            extract: menu_items_link,
        })
    }

    /// Add a relationship
    pub fn with_entry(mut self, entry: ChildCollection) -> Self {
        self.entries.push(entry);
        self
    }

    /// Whether any relationship starts at `type_name`
    pub fn has_children(&self, type_name: &str) -> bool {
        self.entries.iter().any(|e| e.parent_type == type_name)
    }

    /// Child targets of `record`, in table order
    pub fn children_of(&self, record: &Record) -> Vec<FetchTarget> {
        self.entries
            .iter()
            .filter(|e| e.parent_type == record.type_name)
            .filter_map(|e| e.target_for(record))
            .collect()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `meta.links.self` of a WP API Menus menu
fn menu_items_link(record: &Record) -> Option<String> {
    record
        .pointer(&["meta", "links", "self"])
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
