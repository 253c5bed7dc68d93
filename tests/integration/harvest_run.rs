//! End-to-end runs against a mock WordPress site

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_rest_harvester::harvest::{ChildCollection, ExpansionTable, HarvestError};
use wp_rest_harvester::Record;

use crate::support::{
    config_for, harvester, mount_document, mount_page, mount_root, root_document, route,
};

fn ids(records: &[wp_rest_harvester::Record], type_name: &str) -> Vec<i64> {
    records
        .iter()
        .filter(|r| r.type_name == type_name)
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

#[tokio::test]
async fn test_full_run_merges_pages_and_expands_menus() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_root(
        &server,
        root_document(json!({
            "/wp/v2/posts": route("wp/v2"),
            "/wp/v2/posts/(?P<id>[\\d]+)": {"namespace": "wp/v2"},
            "/wp/v2/types": route("wp/v2"),
            "/wp-api-menus/v2/menus": route("wp-api-menus/v2"),
        })),
    )
    .await;

    mount_page(&server, "/wp/v2/posts", 1, 5, 3, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/wp/v2/posts", 2, 5, 3, json!([{"id": 3}, {"id": 4}])).await;
    mount_page(&server, "/wp/v2/posts", 3, 5, 3, json!([{"id": 5}])).await;
    mount_document(&server, "/wp/v2/types", json!({"post": {"slug": "post"}})).await;
    mount_document(
        &server,
        "/wp-api-menus/v2/menus",
        json!([
            {"ID": 2, "name": "Main", "meta": {"links": {"self": format!("{uri}/wp-api-menus/v2/menus/2")}}},
            {"ID": 3, "name": "Footer", "meta": {"links": {"self": format!("{uri}/wp-api-menus/v2/menus/3")}}},
        ]),
    )
    .await;
    mount_document(&server, "/wp-api-menus/v2/menus/2", json!({"ID": 2, "items": [{"id": 10}]})).await;
    mount_document(&server, "/wp-api-menus/v2/menus/3", json!({"ID": 3, "items": []})).await;

    let outcome = harvester(config_for(&server)).run().await.unwrap();
    let records = &outcome.records;

    assert_eq!(records[0].type_name, "wordpress__site_metadata");
    assert_eq!(records[0].get("name"), Some(&json!("Test Blog")));

    assert_eq!(ids(records, "wordpress__wp_posts"), vec![1, 2, 3, 4, 5]);

    let types: Vec<_> = records
        .iter()
        .filter(|r| r.type_name == "wordpress__wp_types")
        .collect();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].get("post"), Some(&json!({"slug": "post"})));

    let items: Vec<_> = records
        .iter()
        .filter(|r| r.type_name == "wordpress__wp_api_menus_menus_items")
        .map(|r| r.get("ID").cloned())
        .collect();
    assert_eq!(items, vec![Some(json!(2)), Some(json!(3))]);

    let summary = &outcome.summary;
    assert_eq!(summary.targets, 3);
    assert_eq!(summary.records_by_type["wordpress__wp_api_menus_menus"], 2);
    assert_eq!(summary.total_records(), records.len());
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_failed_page_is_omitted_and_run_continues() {
    let server = MockServer::start().await;

    mount_root(
        &server,
        root_document(json!({
            "/wp/v2/posts": route("wp/v2"),
            "/wp/v2/tags": route("wp/v2"),
            "/wp/v2/users": route("wp/v2"),
        })),
    )
    .await;

    mount_page(&server, "/wp/v2/posts", 1, 5, 3, json!([{"id": 1}, {"id": 2}])).await;
    Mock::given(method("GET"))
        .and(path("/wp/v2/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db gone"})))
        .mount(&server)
        .await;
    mount_page(&server, "/wp/v2/posts", 3, 5, 3, json!([{"id": 5}])).await;

    Mock::given(method("GET"))
        .and(path("/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Sorry, you are not allowed"})))
        .mount(&server)
        .await;

    mount_page(&server, "/wp/v2/users", 1, 1, 1, json!([{"id": 7}])).await;

    let outcome = harvester(config_for(&server)).run().await.unwrap();

    assert_eq!(ids(&outcome.records, "wordpress__wp_posts"), vec![1, 2, 5]);
    assert_eq!(ids(&outcome.records, "wordpress__wp_users"), vec![7]);
    assert_eq!(outcome.summary.omitted_pages, 1);
    assert_eq!(outcome.summary.failed_targets, vec!["wordpress__wp_tags"]);
    assert!(!outcome.summary.is_complete());
}

#[tokio::test]
async fn test_root_document_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = harvester(config_for(&server)).run().await.unwrap_err();
    match err {
        HarvestError::RootDocument(http) => assert_eq!(http.status, Some(503)),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_non_index_root_document_is_rejected() {
    let server = MockServer::start().await;
    mount_root(&server, json!({"code": "rest_no_route"})).await;

    let err = harvester(config_for(&server)).run().await.unwrap_err();
    assert!(matches!(err, HarvestError::InvalidRootDocument(_)));
}

#[tokio::test]
async fn test_include_and_exclude_globs() {
    let server = MockServer::start().await;

    mount_root(
        &server,
        root_document(json!({
            "/wp/v2/posts": route("wp/v2"),
            "/wp/v2/comments": route("wp/v2"),
            "/wp-api-menus/v2/menus": route("wp-api-menus/v2"),
        })),
    )
    .await;
    mount_document(&server, "/wp/v2/posts", json!([{"id": 1}])).await;
    Mock::given(method("GET"))
        .and(path("/wp/v2/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.included_routes = vec!["/wp/v2/**".to_string()];
    config.excluded_routes = vec!["**/comments".to_string()];

    let targets = harvester(config).discover().await.unwrap();
    let types: Vec<_> = targets.iter().map(|t| t.type_name.as_str()).collect();
    assert_eq!(types, vec!["wordpress__wp_posts"]);
}

#[tokio::test]
async fn test_refactored_type_and_option_page_tags() {
    let server = MockServer::start().await;

    let mut document = root_document(json!({"/wp/v2/posts": route("wp/v2")}));
    document["namespaces"] = json!(["wp/v2", "acf/v3"]);
    mount_root(&server, document).await;

    mount_document(&server, "/wp/v2/posts", json!([{"id": 1}])).await;
    mount_document(&server, "/wp-json/acf/v3/options/options/", json!({"acf": {"phone": "555"}})).await;
    mount_document(&server, "/wp-json/acf/v3/options/footer", json!({"acf": {"text": "bye"}})).await;

    let mut config = config_for(&server);
    config.use_acf = true;
    config.acf_option_page_ids = vec!["footer".to_string()];
    config.refactored_entity_types.post = Some("Post".to_string());

    let outcome = harvester(config).run().await.unwrap();
    let types: Vec<_> = outcome.records.iter().map(|r| r.type_name.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "wordpress__site_metadata",
            "wordpress__acf_options",
            "wordpress__acf_options",
            "Post",
        ]
    );

    let footer = &outcome.records[2];
    assert_eq!(footer.option_page_id.as_deref(), Some("footer"));
    let serialized = serde_json::to_value(footer).unwrap();
    assert_eq!(serialized["__optionPageId"], "footer");
    assert_eq!(serialized["__type"], "wordpress__acf_options");
}

fn next_link(record: &Record) -> Option<String> {
    record.get("next").and_then(Value::as_str).map(str::to_string)
}

#[tokio::test]
async fn test_chained_children_are_followed_to_the_end() {
    const LEVELS: i64 = 12;
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_root(&server, root_document(json!({"/wp/v2/nodes": route("wp/v2")}))).await;
    mount_document(
        &server,
        "/wp/v2/nodes",
        json!([{"id": 0, "next": format!("{uri}/chain/1")}]),
    )
    .await;
    for level in 2..=LEVELS {
        // The last node points back at the first one
        let next = if level == LEVELS { 1 } else { level + 1 };
        mount_document(
            &server,
            &format!("/chain/{level}"),
            json!({"id": level, "next": format!("{uri}/chain/{next}")}),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/chain/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "next": format!("{uri}/chain/2")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let table = ExpansionTable::empty().with_entry(ChildCollection {
        parent_type: "wordpress__wp_nodes".to_string(),
        child_suffix: "",
        extract: next_link,
    });
    let outcome = harvester(config_for(&server))
        .with_expansion_table(table)
        .run()
        .await
        .unwrap();

    assert_eq!(
        ids(&outcome.records, "wordpress__wp_nodes"),
        (0..=LEVELS).collect::<Vec<_>>()
    );
    let deepest = outcome.summary.reports.iter().map(|r| r.depth).max();
    assert_eq!(deepest, Some(LEVELS as usize));
    assert_eq!(outcome.summary.targets, 1);
    assert!(outcome.summary.is_complete());
}
