//! Include/exclude glob filtering of route paths
//!
//! A route is valid when it matches at least one include pattern and no
//! exclude pattern. Exclusion always wins. The [`BUILT_IN_EXCLUDES`] are
//! unioned with every caller-supplied exclude list.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::{RouteError, RouteResult};

/// Technical routes that are never fetched
pub const BUILT_IN_EXCLUDES: [&str; 8] = [
    "/v2/**",
    "/v3/**",
    "**/1.0",
    "**/2.0",
    "**/embed",
    "**/proxy",
    "/",
    "/jwt-auth/**",
];

/// Outcome of testing one route path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Included and not excluded
    Valid,
    /// No include pattern matched
    NotIncluded,
    /// An exclude pattern matched
    Excluded,
}

impl RouteDecision {
    /// Whether the route should be fetched
    pub fn is_valid(self) -> bool {
        matches!(self, RouteDecision::Valid)
    }
}

/// Compiled include/exclude pattern sets
#[derive(Debug, Clone)]
pub struct RouteFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl RouteFilter {
    /// Compile `include` and `exclude` (plus the built-in excludes)
    pub fn new<I, E>(include: I, exclude: E) -> RouteResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = build_set(include)?;
        let exclude = build_set(
            BUILT_IN_EXCLUDES
                .iter()
                .map(|p| p.to_string())
                .chain(exclude.into_iter().map(|p| p.as_ref().to_string())),
        )?;

        Ok(Self { include, exclude })
    }

    /// Classify a route path
    pub fn decide(&self, route_path: &str) -> RouteDecision {
        // Include first, exclude second; exclusion wins.
        let included = self.include.is_match(route_path);
        let excluded = self.exclude.is_match(route_path);

        if excluded {
            RouteDecision::Excluded
        } else if included {
            RouteDecision::Valid
        } else {
            RouteDecision::NotIncluded
        }
    }

    /// Whether `route_path` is included and not excluded
    pub fn is_valid(&self, route_path: &str) -> bool {
        self.decide(route_path).is_valid()
    }
}

/// One-shot validity check that compiles the pattern lists on every call.
///
/// Prefer [`RouteFilter`] when testing many paths against the same lists.
pub fn is_valid<I, E>(route_path: &str, include: I, exclude: E) -> RouteResult<bool>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    Ok(RouteFilter::new(include, exclude)?.is_valid(route_path))
}

/// Check every pattern compiles, without building a filter
pub fn validate_patterns<I>(patterns: I) -> RouteResult<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    build_set(patterns).map(|_| ())
}

fn build_set<I>(patterns: I) -> RouteResult<GlobSet>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| RouteError::InvalidPattern {
        pattern: e.glob().unwrap_or_default().to_string(),
        message: e.kind().to_string(),
    })
}
