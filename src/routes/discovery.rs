//! Discovery of fetch targets from the API root document
//!
//! The root document (`GET /wp-json`) lists every route the site exposes.
//! Only routes carrying `_links` are independently fetchable; the rest are
//! detail sub-routes such as `/wp/v2/posts/(?P<id>[\d]+)`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::classify::{full_url, manufacturer, raw_entity_type, route_path};
use super::filter::{RouteDecision, RouteFilter};
use super::RouteResult;
use crate::FetchTarget;

/// Namespace used when custom-field mode is on but the site advertises none
pub const DEFAULT_ACF_NAMESPACE: &str = "acf/v3";

/// Marker identifying the custom-field plugin's namespace
const ACF_MARKER: &str = "acf";

/// Manufacturer of WordPress core routes
const CORE_MANUFACTURER: &str = "wp";

/// Root document of a WordPress REST API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RootDocument {
    /// Site name
    pub name: Option<String>,
    /// Site tagline
    pub description: Option<String>,
    /// Site URL
    pub url: Option<String>,
    /// Home URL
    pub home: Option<String>,
    /// Registered namespaces, e.g. `wp/v2`, `acf/v3`
    pub namespaces: Vec<String>,
    /// Route key to raw descriptor, in document order
    pub routes: Map<String, Value>,
}

impl RootDocument {
    /// Parse a root document from a JSON body
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// Raw route descriptor as advertised by the root document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteDescriptor {
    /// Namespace the route belongs to, e.g. `wp/v2`
    pub namespace: String,
    /// Hypermedia links; absent on detail sub-routes
    #[serde(rename = "_links")]
    pub links: Option<Value>,
}

impl RouteDescriptor {
    /// Whether the route advertises hypermedia links
    pub fn has_links(&self) -> bool {
        matches!(&self.links, Some(v) if !v.is_null())
    }
}

/// Caller-supplied replacements for the well-known core type names
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RefactoredEntityTypes {
    /// Replacement for `<prefix>posts`
    pub post: Option<String>,
    /// Replacement for `<prefix>pages`
    pub page: Option<String>,
    /// Replacement for `<prefix>tags`
    pub tag: Option<String>,
    /// Replacement for `<prefix>categories`
    pub category: Option<String>,
}

impl RefactoredEntityTypes {
    fn lookup(&self, raw_entity_type: &str) -> Option<&str> {
        match raw_entity_type {
            "posts" => self.post.as_deref(),
            "pages" => self.page.as_deref(),
            "tags" => self.tag.as_deref(),
            "categories" => self.category.as_deref(),
            _ => None,
        }
    }
}

/// Inputs to [`discover_targets`]
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// API root URL, e.g. `https://example.com/wp-json`
    pub api_root: String,
    /// Include globs
    pub included_routes: Vec<String>,
    /// Exclude globs (built-in excludes are added automatically)
    pub excluded_routes: Vec<String>,
    /// Prefix of every type name
    pub type_prefix: String,
    /// Enable ACF (custom-field plugin) handling
    pub use_acf: bool,
    /// ACF option page ids to fetch individually
    pub acf_option_page_ids: Vec<String>,
    /// Site is hosted on wordpress.com
    pub hosting_wpcom: bool,
    /// Overrides for core post/page/tag/category types
    pub refactored_entity_types: RefactoredEntityTypes,
}

/// Compose the type name of a route.
///
/// Core (`wp`) posts, pages, tags and categories use the matching override
/// when one is configured. Everything else becomes
/// `<prefix><manufacturer>_<entity>` with `-` normalized to `_`.
pub fn compose_type_name(
    type_prefix: &str,
    manufacturer: &str,
    raw_entity_type: &str,
    overrides: &RefactoredEntityTypes,
) -> String {
    if manufacturer == CORE_MANUFACTURER {
        if let Some(name) = overrides.lookup(raw_entity_type) {
            return name.to_string();
        }
    }

    format!(
        "{type_prefix}{}_{}",
        manufacturer.replace('-', "_"),
        raw_entity_type.replace('-', "_")
    )
}

/// Build the ordered list of fetch targets.
///
/// ACF targets come first, then every valid route in document order.
///
/// # Errors
///
/// Fails when `api_root` is not a valid URL or a glob is malformed.
pub fn discover_targets(
    document: &RootDocument,
    options: &DiscoveryOptions,
) -> RouteResult<Vec<FetchTarget>> {
    let mut targets = Vec::new();
    let mut included = options.included_routes.clone();

    if options.use_acf {
        let namespace = acf_targets(document, options, &mut targets);
        included.push(format!("/{namespace}/**"));
    }

    let filter = RouteFilter::new(&included, &options.excluded_routes)?;

    for (key, raw) in &document.routes {
        debug!(route = %key, "Route discovered");

        let descriptor: RouteDescriptor = match serde_json::from_value(raw.clone()) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                debug!(route = %key, "Skipping unreadable route descriptor: {e}");
                continue;
            }
        };

        if !descriptor.has_links() {
            debug!(route = %key, "Invalid route: detail route");
            continue;
        }

        let path = route_path(&options.api_root, key)?;
        match filter.decide(&path) {
            RouteDecision::Valid => {}
            RouteDecision::Excluded => {
                debug!(route = %key, "Excluded route: blacklisted");
                continue;
            }
            RouteDecision::NotIncluded => {
                debug!(route = %key, "Excluded route: not whitelisted");
                continue;
            }
        }

        let type_name = compose_type_name(
            &options.type_prefix,
            manufacturer(&descriptor.namespace),
            raw_entity_type(key),
            &options.refactored_entity_types,
        );
        debug!(route = %key, type_name = %type_name, "Valid route found");

        targets.push(FetchTarget::new(
            full_url(&options.api_root, key)?,
            type_name,
        ));
    }

    info!("Discovered {} valid API routes", targets.len());
    Ok(targets)
}

/// Push the ACF option targets and return the detected namespace
fn acf_targets(
    document: &RootDocument,
    options: &DiscoveryOptions,
    targets: &mut Vec<FetchTarget>,
) -> String {
    let namespace = document
        .namespaces
        .iter()
        .find(|ns| ns.contains(ACF_MARKER))
        .map_or(DEFAULT_ACF_NAMESPACE, String::as_str)
        .to_string();
    info!("Detected ACF to REST namespace: {namespace}");

    // The options route has no usable _links, so it is added by hand.
    // ACF to REST v3 serves it at options/options.
    let is_v3 = namespace.contains('3');
    let options_route = if is_v3 { "options/options/" } else { "options/" };
    let type_name = format!("{}acf_options", options.type_prefix);

    targets.push(FetchTarget::new(
        format!("{}/{namespace}/{options_route}", options.api_root),
        type_name.clone(),
    ));

    let ids = &options.acf_option_page_ids;
    if ids.is_empty() {
        return namespace;
    }

    if is_v3 {
        for id in ids {
            targets.push(
                FetchTarget::new(
                    format!("{}/{namespace}/options/{id}", options.api_root),
                    type_name.clone(),
                )
                .with_option_page_id(id.clone()),
            );
        }
        info!("Added {} ACF option page route(s)", ids.len());
    } else {
        warn!(
            namespace = %namespace,
            "ACF option page ids are only supported by ACF to REST v3; ignoring them"
        );
    }

    if options.hosting_wpcom {
        warn!("ACF option pages are untested under wordpress.com hosting");
    }

    namespace
}
