//! Pure string transforms over route keys and namespaces

use url::Url;

use super::{RouteError, RouteResult};

fn parse_base(base_url: &str) -> RouteResult<Url> {
    Url::parse(base_url).map_err(|source| RouteError::UrlParse {
        url: base_url.to_string(),
        source,
    })
}

/// Strip the base URL's path prefix from `full_path`.
///
/// The result is the key matched against include/exclude globs. Only the path
/// component of `base_url` is considered; a root base path leaves `full_path`
/// untouched.
///
/// # Examples
///
/// ```
/// use wp_rest_harvester::routes::classify::route_path;
///
/// let path = route_path("https://example.com/wp-json", "/wp-json/wp/v2/posts").unwrap();
/// assert_eq!(path, "/wp/v2/posts");
/// ```
pub fn route_path(base_url: &str, full_path: &str) -> RouteResult<String> {
    let base = parse_base(base_url)?;
    let base_path = base.path().trim_end_matches('/');

    if base_path.is_empty() {
        return Ok(full_path.to_string());
    }

    Ok(full_path
        .strip_prefix(base_path)
        .unwrap_or(full_path)
        .to_string())
}

/// Combine the origin of `base_url` (scheme, host, port) with `full_path`.
///
/// The path component of `base_url` is never reused.
pub fn full_url(base_url: &str, full_path: &str) -> RouteResult<String> {
    let base = parse_base(base_url)?;
    Ok(format!("{}{}", base.origin().ascii_serialization(), full_path))
}

/// Final `/`-delimited segment of `full_path`
pub fn raw_entity_type(full_path: &str) -> &str {
    full_path
        .rsplit_once('/')
        .map_or(full_path, |(_, last)| last)
}

/// Namespace with its trailing `/<version>` segment removed (`wp/v2` → `wp`).
///
/// A namespace without any `/` has no manufacturer and yields an empty string.
pub fn manufacturer(namespace: &str) -> &str {
    namespace.rsplit_once('/').map_or("", |(head, _)| head)
}
