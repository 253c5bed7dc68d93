//! Route classification and filter rules through the public API

use wp_rest_harvester::routes::classify::{full_url, manufacturer, raw_entity_type, route_path};
use wp_rest_harvester::routes::discovery::{compose_type_name, RefactoredEntityTypes};
use wp_rest_harvester::routes::filter::is_valid;
use wp_rest_harvester::routes::{RouteError, RouteFilter};

const NONE: [&str; 0] = [];

#[test]
fn test_exclude_wins_over_include() {
    assert!(!is_valid("/wp/v2/types", ["/wp/v2/**"], ["/wp/v2/types"]).unwrap());
    assert!(is_valid("/wp/v2/posts", ["/wp/v2/**"], ["/wp/v2/types"]).unwrap());
}

#[test]
fn test_built_in_excludes_always_apply() {
    assert!(!is_valid("/jwt-auth/v1/token", ["/**"], NONE).unwrap());
    assert!(!is_valid("/", ["**"], NONE).unwrap());
    assert!(!is_valid("/oembed/1.0", ["**"], NONE).unwrap());
    assert!(!is_valid("/oembed/1.0/embed", ["**"], NONE).unwrap());
    assert!(!is_valid("/oembed/1.0/proxy", ["**"], NONE).unwrap());
}

#[test]
fn test_single_star_stays_within_a_segment() {
    assert!(is_valid("/wp/v2/posts", ["/wp/v2/*"], NONE).unwrap());
    assert!(!is_valid("/wp/v2/posts/revisions", ["/wp/v2/*"], NONE).unwrap());
    assert!(is_valid("/wp/v2/posts/revisions", ["/wp/v2/**"], NONE).unwrap());
    assert!(is_valid("/wp/v2/tags", ["/wp/v2/tag?"], NONE).unwrap());
}

#[test]
fn test_nothing_included_means_nothing_valid() {
    let filter = RouteFilter::new(NONE, NONE).unwrap();
    assert!(!filter.is_valid("/wp/v2/posts"));
}

#[test]
fn test_malformed_glob_is_reported() {
    let err = RouteFilter::new(["/wp/{v2"], NONE).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
}

#[test]
fn test_url_construction() {
    assert_eq!(
        full_url("https://example.com/wp-json", "/wp/v2/posts").unwrap(),
        "https://example.com/wp/v2/posts"
    );
    assert_eq!(
        route_path("https://example.com/wp-json", "/wp/v2/posts").unwrap(),
        "/wp/v2/posts"
    );
    assert_eq!(
        full_url("http://localhost:8080/blog/wp-json", "/wp/v2/pages").unwrap(),
        "http://localhost:8080/wp/v2/pages"
    );
    assert!(matches!(
        full_url("not a url", "/wp/v2/posts"),
        Err(RouteError::UrlParse { .. })
    ));
}

#[test]
fn test_type_composition() {
    let overrides = RefactoredEntityTypes {
        post: Some("MyPost".to_string()),
        ..Default::default()
    };

    let path = "/wp/v2/posts";
    assert_eq!(
        compose_type_name("wordpress__", manufacturer("wp/v2"), raw_entity_type(path), &overrides),
        "MyPost"
    );
    assert_eq!(
        compose_type_name(
            "wordpress__",
            manufacturer("acf/v3"),
            raw_entity_type("/acf/v3/options"),
            &RefactoredEntityTypes::default()
        ),
        "wordpress__acf_options"
    );
}
