//! Tests for the mock engine.
//!
//! This module covers:
//! - Collection resolution through `from` chains
//! - Referential validation and alerts
//! - Override precedence and restore
//! - Dispatch outcomes, delays and sub-routers
//! - Strict mode and handler kind registration

use super::*;
use crate::alerts::Alerts;
use crate::variant_handlers::{
    middleware, respond, HandlerError, VariantContext, VariantHandler, VariantHandlerKind,
    VariantHandlerRegistry,
};
use http_body_util::BodyExt;
use hyper::{HeaderMap, Method, StatusCode};
use mockyard_schema::Value;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn mock() -> Mock {
    Mock::new(MockOptions::default(), Alerts::new("mock")).unwrap()
}

fn mock_with(options: MockOptions) -> Mock {
    Mock::new(options, Alerts::new("mock")).unwrap()
}

/// A GET route whose variants answer `text` bodies equal to their own id.
fn text_route(id: &str, url: &str, variants: &[&str]) -> Value {
    let variants: Vec<serde_json::Value> = variants
        .iter()
        .map(|v| json!({"id": v, "type": "text", "options": {"status": 200, "body": format!("{id}:{v}")}}))
        .collect();
    Value::from(json!({"id": id, "url": url, "method": "GET", "variants": variants}))
}

fn collection(id: &str, from: Option<&str>, routes: &[&str]) -> Value {
    Value::from(json!({"id": id, "from": from, "routes": routes}))
}

fn three_routes() -> Vec<Value> {
    vec![
        text_route("r1", "/r1", &["v1", "v2", "v3"]),
        text_route("r2", "/r2", &["v1", "v2"]),
        text_route("r3", "/r3", &["v1"]),
    ]
}

async fn call(mock: &Mock, method: Method, path: &str) -> Option<(StatusCode, String)> {
    let request = MockRequest::new(method, path.parse().unwrap());
    match mock.dispatch(request).await.unwrap() {
        DispatchOutcome::Responded(response) => {
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            Some((status, String::from_utf8(bytes.to_vec()).unwrap()))
        }
        DispatchOutcome::Unhandled(_) => None,
    }
}

async fn get_body(mock: &Mock, path: &str) -> Option<String> {
    call(mock, Method::GET, path).await.map(|(_, body)| body)
}

fn resolved(mock: &Mock, id: &str) -> Vec<String> {
    mock.collection(id).unwrap().routes
}

fn alert_ids(mock: &Mock) -> Vec<String> {
    mock.alerts().list().into_iter().map(|a| a.id).collect()
}

// =============================================================================
// Collection resolution
// =============================================================================

#[test]
fn test_child_inherits_parent_routes() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("child", Some("base"), &["r2:v1"]),
        ],
    )
    .unwrap();

    assert_eq!(resolved(&mock, "child"), vec!["r1:v1", "r2:v1"]);
}

#[test]
fn test_child_overrides_parent_route() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("child", Some("base"), &["r2:v1", "r1:v2"]),
        ],
    )
    .unwrap();

    assert_eq!(resolved(&mock, "child"), vec!["r1:v2", "r2:v1"]);
    assert_eq!(
        mock.collection("child").unwrap().defined_routes,
        vec!["r2:v1", "r1:v2"]
    );
}

#[test]
fn test_routes_without_variant_are_omitted() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r2:v2"]),
            collection("child", Some("base"), &["r1:v3"]),
        ],
    )
    .unwrap();

    let routes = resolved(&mock, "child");
    assert_eq!(routes, vec!["r1:v3", "r2:v2"]);
    assert!(routes.iter().all(|r| !r.starts_with("r3:")));
}

#[test]
fn test_resolution_follows_route_order_not_declaration_order() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("grandparent", None, &["r3:v1"]),
            collection("parent", Some("grandparent"), &["r2:v2"]),
            collection("child", Some("parent"), &["r1:v1"]),
        ],
    )
    .unwrap();

    assert_eq!(resolved(&mock, "child"), vec!["r1:v1", "r2:v2", "r3:v1"]);
    assert_eq!(resolved(&mock, "parent"), vec!["r2:v2", "r3:v1"]);
}

#[test]
fn test_root_collection_resolves_to_its_valid_definitions() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![collection("base", None, &["r3:v1", "missing:v1", "r1:v2"])],
    )
    .unwrap();

    // filtered by referential validity, ordered by route definition order
    assert_eq!(resolved(&mock, "base"), vec!["r1:v2", "r3:v1"]);
    assert_eq!(
        mock.collection("base").unwrap().defined_routes,
        vec!["r3:v1", "r1:v2"]
    );
}

#[test]
fn test_circular_chain_resolves_empty_with_one_alert() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("loop", Some("loop"), &["r2:v1"]),
        ],
    )
    .unwrap();

    assert!(resolved(&mock, "loop").is_empty());
    assert_eq!(resolved(&mock, "base"), vec!["r1:v1"]);

    let loop_alerts: Vec<_> = mock
        .alerts()
        .list()
        .into_iter()
        .filter(|a| a.id.contains("loop"))
        .collect();
    assert_eq!(loop_alerts.len(), 1);
    assert_eq!(loop_alerts[0].id, "mock:collections:from:loop");
    assert!(loop_alerts[0].message.contains("loop -> loop"));
}

#[test]
fn test_two_collection_cycle_and_its_descendant_resolve_empty() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("a", Some("b"), &["r1:v1"]),
            collection("b", Some("a"), &["r2:v1"]),
            collection("c", Some("a"), &["r3:v1"]),
        ],
    )
    .unwrap();

    for id in ["a", "b", "c"] {
        assert!(resolved(&mock, id).is_empty(), "{id} should resolve empty");
        let from_alerts: Vec<_> = mock
            .alerts()
            .list()
            .into_iter()
            .filter(|a| a.id == format!("mock:collections:from:{id}"))
            .collect();
        assert_eq!(from_alerts.len(), 1, "alerts for {id}");
    }

    let messages: Vec<String> = mock
        .alerts()
        .list()
        .into_iter()
        .filter(|a| a.id.starts_with("mock:collections:from:"))
        .map(|a| a.message)
        .collect();
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().any(|m| m.contains("a -> b -> a")));
    assert!(messages.iter().any(|m| m.contains("c -> a -> b -> a")));
}

#[test]
fn test_missing_parent_resolves_empty() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![collection("orphan", Some("ghost"), &["r1:v1"])],
    )
    .unwrap();

    assert!(resolved(&mock, "orphan").is_empty());
    let alerts = mock.alerts().list();
    assert!(alerts
        .iter()
        .any(|a| a.id == "mock:collections:from:orphan" && a.message.contains("\"ghost\" was not found")));
}

#[test]
fn test_resolved_routes_are_unique_and_known() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("a", None, &["r1:v1", "r2:v1", "r3:v1"]),
            collection("b", Some("a"), &["r1:v2", "r2:v2"]),
            collection("c", Some("b"), &["r1:v3"]),
        ],
    )
    .unwrap();

    let route_ids: Vec<String> = mock.list_routes().into_iter().map(|r| r.id).collect();
    for summary in mock.list_collections() {
        let owners: Vec<&str> = summary
            .routes
            .iter()
            .map(|c| c.split(':').next().unwrap())
            .collect();
        let mut unique = owners.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(owners.len(), unique.len(), "duplicates in {}", summary.id);
        assert!(owners.iter().all(|r| route_ids.iter().any(|id| id == r)));
    }
    assert_eq!(resolved(&mock, "c"), vec!["r1:v3", "r2:v2", "r3:v1"]);
}

// =============================================================================
// Referential validation
// =============================================================================

#[test]
fn test_collection_problems_are_aggregated() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![collection("base", None, &["r1:v1", "r9:v1", "r1:v2", "r2:nope"])],
    )
    .unwrap();

    let alerts: Vec<_> = mock
        .alerts()
        .list()
        .into_iter()
        .filter(|a| a.id == "mock:collections:validation:base")
        .collect();
    assert_eq!(alerts.len(), 1);
    let message = &alerts[0].message;
    assert!(message.starts_with("Collection with id \"base\" is invalid: "));
    assert!(message.contains("\"r9:v1\": not found, use a valid \"routeId:variantId\" identifier"));
    assert!(message.contains("\"r2:nope\": not found"));
    assert!(message.contains("\"r1:v2\": route is used more than once in the same collection"));

    // the collection is kept with its valid entries
    assert_eq!(resolved(&mock, "base"), vec!["r1:v1"]);
}

#[test]
fn test_invalid_collection_schema_drops_collection() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            Value::from(json!({"id": "broken", "routes": "r1:v1"})),
            collection("base", None, &["r1:v1"]),
        ],
    )
    .unwrap();

    assert!(mock.collection("broken").is_none());
    assert_eq!(mock.selected_collection().as_deref(), Some("base"));
    let alert = mock
        .alerts()
        .list()
        .into_iter()
        .find(|a| a.id == "mock:collections:validation:broken")
        .unwrap();
    assert!(alert.message.contains("/routes: must be array"));
}

// =============================================================================
// Route validation
// =============================================================================

#[test]
fn test_unregistered_kind_names_variant_and_route() {
    let mock = mock();
    mock.load_routes(vec![Value::from(json!({
        "id": "users",
        "url": "/users",
        "method": "GET",
        "variants": [{"id": "odd", "type": "unregistered-kind", "options": {}}]
    }))])
    .unwrap();

    assert!(mock.list_routes().is_empty());
    let alert = mock
        .alerts()
        .list()
        .into_iter()
        .find(|a| a.id == "mock:routes:validation:users")
        .unwrap();
    assert!(alert.message.starts_with("Route with id \"users\" is invalid: "));
    assert!(alert.message.contains("variant \"odd\" /type"));
    assert!(alert.message.contains("must be equal to one of the allowed values"));
}

#[test]
fn test_invalid_route_does_not_affect_valid_ones() {
    let mock = mock();
    let summary = mock
        .load_definitions(
            vec![
                Value::from(json!({"id": "no-url", "method": "GET", "variants": []})),
                text_route("ok", "/ok", &["v1"]),
            ],
            vec![collection("base", None, &["ok:v1"])],
        )
        .unwrap();

    assert_eq!(summary.routes, 1);
    assert_eq!(summary.invalid, 1);
    assert!(alert_ids(&mock).contains(&"mock:routes:validation:no-url".to_string()));
}

#[test]
fn test_listing_round_trip_preserves_order() {
    let mock = mock();
    mock.load_routes(vec![
        Value::from(json!({
            "id": "users", "url": "/api/users/:id", "method": ["get", "PUT"], "delay": 10,
            "variants": [
                {"id": "ok", "type": "json", "options": {"status": 200, "body": {"id": 1}}},
                {"id": "off", "disabled": true},
                {"id": "error", "type": "status", "delay": 0, "options": {"status": 500}}
            ]
        })),
        text_route("books", "/api/books", &["all"]),
    ])
    .unwrap();

    let routes = mock.list_routes();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].id, "users");
    assert_eq!(routes[0].method, json!(["get", "PUT"]));
    assert_eq!(routes[0].url, json!("/api/users/:id"));
    assert_eq!(routes[0].delay, Some(10));
    assert_eq!(routes[0].variants, vec!["users:ok", "users:off", "users:error"]);
    assert_eq!(routes[1].id, "books");

    let variants = mock.list_variants();
    let ids: Vec<&str> = variants.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["users:ok", "users:off", "users:error", "books:all"]);
    assert_eq!(variants[0].preview, Some(json!({"status": 200, "body": {"id": 1}})));
    assert!(variants[1].disabled);
    assert_eq!(variants[1].kind, None);
    assert_eq!(variants[2].delay, Some(0));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_missing_selected_collection_falls_back_to_first() {
    let mock = mock_with(MockOptions {
        selected_collection: Some("nope".to_string()),
        ..Default::default()
    });
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("other", None, &["r1:v2"]),
        ],
    )
    .unwrap();

    assert_eq!(mock.selected_collection().as_deref(), Some("base"));
    let alert = mock
        .alerts()
        .list()
        .into_iter()
        .find(|a| a.id == "mock:settings")
        .unwrap();
    assert_eq!(
        alert.message,
        "Collection \"nope\" was not found. Selecting the first one found"
    );
}

#[tokio::test]
async fn test_no_collections_leaves_requests_unhandled() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![]).unwrap();

    assert_eq!(mock.selected_collection(), None);
    assert!(get_body(&mock, "/r1").await.is_none());
    assert!(mock
        .alerts()
        .list()
        .iter()
        .any(|a| a.id == "mock:settings" && a.message == "No collections found"));

    // overrides still apply
    mock.set_override("r1:v2").unwrap();
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v2"));
}

#[tokio::test]
async fn test_select_collection() {
    let mock = mock_with(MockOptions {
        selected_collection: Some("base".to_string()),
        ..Default::default()
    });
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("errors", Some("base"), &["r1:v3"]),
        ],
    )
    .unwrap();
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v1"));

    mock.select_collection("errors").unwrap();
    assert_eq!(mock.selected_collection().as_deref(), Some("errors"));
    assert_eq!(mock.options().selected_collection.as_deref(), Some("errors"));
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v3"));

    let err = mock.select_collection("ghost").unwrap_err();
    assert!(matches!(err, MockError::CollectionNotFound(ref id) if id == "ghost"));
    assert_eq!(mock.selected_collection().as_deref(), Some("errors"));
}

#[tokio::test]
async fn test_selection_survives_reload() {
    let mock = mock();
    let collections = vec![
        collection("base", None, &["r1:v1"]),
        collection("errors", None, &["r1:v3"]),
    ];
    mock.load_definitions(three_routes(), collections.clone()).unwrap();
    mock.select_collection("errors").unwrap();

    mock.load_definitions(three_routes(), collections).unwrap();
    assert_eq!(mock.selected_collection().as_deref(), Some("errors"));
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v3"));
}

// =============================================================================
// Overrides
// =============================================================================

#[tokio::test]
async fn test_override_takes_precedence_until_restored() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![collection("base", None, &["r1:v1", "r2:v1"])],
    )
    .unwrap();
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v1"));

    mock.set_override("r1:v3").unwrap();
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v3"));
    assert_eq!(get_body(&mock, "/r2").await.as_deref(), Some("r2:v1"));

    mock.restore_overrides();
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v1"));
}

#[tokio::test]
async fn test_override_is_independent_of_collection_switch() {
    let mock = mock();
    mock.load_definitions(
        three_routes(),
        vec![
            collection("base", None, &["r1:v1"]),
            collection("other", None, &["r1:v2"]),
        ],
    )
    .unwrap();
    mock.set_override("r1:v3").unwrap();

    mock.select_collection("other").unwrap();
    assert_eq!(mock.overrides(), vec!["r1:v3"]);
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v3"));

    mock.restore_overrides();
    assert_eq!(mock.selected_collection().as_deref(), Some("other"));
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v2"));
}

#[test]
fn test_override_operations_are_idempotent() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![collection("base", None, &["r1:v1"])])
        .unwrap();

    mock.set_override("r1:v2").unwrap();
    mock.set_override("r1:v2").unwrap();
    assert_eq!(mock.overrides(), vec!["r1:v2"]);

    mock.set_override("r1:v3").unwrap();
    assert_eq!(mock.overrides(), vec!["r1:v3"]);

    mock.restore_overrides();
    mock.restore_overrides();
    assert!(mock.overrides().is_empty());
}

#[test]
fn test_override_of_unknown_variant_is_rejected() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![]).unwrap();
    let err = mock.set_override("r1:v9").unwrap_err();
    assert!(matches!(err, MockError::VariantNotFound(ref id) if id == "r1:v9"));
    assert!(mock.overrides().is_empty());
}

#[tokio::test]
async fn test_stale_override_is_alerted_and_ignored() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![collection("base", None, &["r1:v1"])])
        .unwrap();
    mock.set_override("r1:v3").unwrap();

    let mut routes = three_routes();
    routes[0] = text_route("r1", "/r1", &["v1", "v2"]);
    mock.load_definitions(routes, vec![collection("base", None, &["r1:v1"])])
        .unwrap();

    assert_eq!(mock.overrides(), vec!["r1:v3"]);
    assert!(alert_ids(&mock).contains(&"mock:overrides:r1:v3".to_string()));
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v1"));

    mock.restore_overrides();
    assert!(!alert_ids(&mock).iter().any(|id| id.starts_with("mock:overrides")));
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_method_and_path_matching() {
    let mock = mock();
    mock.load_definitions(
        vec![
            Value::from(json!({
                "id": "create", "url": "/users", "method": ["post", "put"],
                "variants": [{"id": "ok", "type": "status", "options": {"status": 201}}]
            })),
            Value::from(json!({
                "id": "any", "url": "/users/:id", "method": "*",
                "variants": [{"id": "ok", "type": "text", "options": {"status": 200, "body": "any"}}]
            })),
        ],
        vec![collection("base", None, &["create:ok", "any:ok"])],
    )
    .unwrap();

    assert_eq!(
        call(&mock, Method::POST, "/users").await.map(|(s, _)| s),
        Some(StatusCode::CREATED)
    );
    assert!(call(&mock, Method::GET, "/users").await.is_none());
    assert_eq!(
        call(&mock, Method::DELETE, "/USERS/1/").await.map(|(_, b)| b).as_deref(),
        Some("any")
    );
    assert!(call(&mock, Method::GET, "/users/1/books").await.is_none());
}

#[tokio::test]
async fn test_first_matching_route_wins() {
    let mock = mock();
    mock.load_definitions(
        vec![
            text_route("specific", "/users/me", &["v1"]),
            text_route("generic", "/users/:id", &["v1"]),
        ],
        vec![collection("base", None, &["specific:v1", "generic:v1"])],
    )
    .unwrap();

    assert_eq!(get_body(&mock, "/users/me").await.as_deref(), Some("specific:v1"));
    assert_eq!(get_body(&mock, "/users/7").await.as_deref(), Some("generic:v1"));
}

#[tokio::test]
async fn test_matched_route_without_variant_is_unhandled() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![collection("base", None, &["r1:v1"])])
        .unwrap();

    let request = MockRequest::new(Method::GET, "/r2".parse().unwrap());
    let outcome = mock.dispatch(request).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Unhandled(Unhandled::NoVariantSelected)));

    let request = MockRequest::new(Method::GET, "/nowhere".parse().unwrap());
    let outcome = mock.dispatch(request).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Unhandled(Unhandled::NoRouteMatched)));
}

#[tokio::test]
async fn test_disabled_variant_is_unhandled() {
    let mock = mock();
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "users", "url": "/users", "method": "GET",
            "variants": [
                {"id": "ok", "type": "status", "options": {"status": 200}},
                {"id": "off", "disabled": true}
            ]
        }))],
        vec![collection("base", None, &["users:off"])],
    )
    .unwrap();

    let request = MockRequest::new(Method::GET, "/users".parse().unwrap());
    let outcome = mock.dispatch(request).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Unhandled(Unhandled::VariantDisabled)));

    mock.set_override("users:ok").unwrap();
    assert!(call(&mock, Method::GET, "/users").await.is_some());
}

#[tokio::test]
async fn test_handler_errors_are_returned() {
    let mock = mock();
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "report", "url": "/report", "method": "GET",
            "variants": [{"id": "file", "type": "file", "options": {"path": "/no/such/report.csv", "status": 200}}]
        }))],
        vec![collection("base", None, &["report:file"])],
    )
    .unwrap();

    let request = MockRequest::new(Method::GET, "/report".parse().unwrap());
    assert!(matches!(mock.dispatch(request).await, Err(HandlerError::Io(_))));
}

#[tokio::test]
async fn test_delay_precedence() {
    let mock = mock_with(MockOptions {
        delay: 400,
        ..Default::default()
    });
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "slow", "url": "/slow", "method": "GET", "delay": 60,
            "variants": [
                {"id": "route-delay", "type": "status", "options": {"status": 200}},
                {"id": "no-delay", "type": "status", "delay": 0, "options": {"status": 200}}
            ]
        }))],
        vec![collection("base", None, &["slow:route-delay"])],
    )
    .unwrap();

    let start = Instant::now();
    assert!(call(&mock, Method::GET, "/slow").await.is_some());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(60));
    assert!(elapsed < Duration::from_millis(400));

    mock.set_override("slow:no-delay").unwrap();
    let start = Instant::now();
    assert!(call(&mock, Method::GET, "/slow").await.is_some());
    assert!(start.elapsed() < Duration::from_millis(60));
}

#[tokio::test]
async fn test_global_delay_applies_without_route_delay() {
    let mock = mock();
    mock.load_definitions(three_routes(), vec![collection("base", None, &["r1:v1"])])
        .unwrap();
    mock.set_delay(50);
    assert_eq!(mock.options().delay, 50);

    let start = Instant::now();
    assert!(get_body(&mock, "/r1").await.is_some());
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_middleware_and_regex_url_through_the_rust_api() {
    let mock = mock();
    let echo = middleware("echo", |request: MockRequest| async move {
        let body = format!(
            "{}:{}",
            request.params.get("kind").cloned().unwrap_or_default(),
            request.params.get("1").cloned().unwrap_or_default()
        );
        respond(StatusCode::OK, Some("text/plain"), &HeaderMap::new(), body).map(Some)
    });
    let route = Value::object([
        ("id", Value::from("items")),
        ("url", Value::Regex(Regex::new(r"^/api/(?P<kind>users|books)/(\d+)$").unwrap())),
        ("method", Value::from("GET")),
        (
            "variants",
            Value::Array(vec![Value::object([
                ("id", Value::from("echo")),
                ("type", Value::from("middleware")),
                ("options", Value::object([("middleware", echo)])),
            ])]),
        ),
    ]);
    mock.load_definitions(vec![route], vec![collection("base", None, &["items:echo"])])
        .unwrap();

    assert_eq!(get_body(&mock, "/api/books/12").await.as_deref(), Some("books:12"));
    assert_eq!(mock.list_routes()[0].url, json!(r"^/api/(?P<kind>users|books)/(\d+)$"));
}

#[tokio::test]
async fn test_static_variant_is_mounted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello").unwrap();

    let mock = mock();
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "assets", "url": "/assets", "method": "GET",
            "variants": [{"id": "dir", "type": "static", "options": {"path": dir.path().to_str().unwrap()}}]
        }))],
        vec![collection("base", None, &["assets:dir"])],
    )
    .unwrap();

    assert_eq!(get_body(&mock, "/assets/hello.txt").await.as_deref(), Some("hello"));
    assert!(get_body(&mock, "/assets/missing.txt").await.is_none());
}

#[tokio::test]
async fn test_prefix_match_follows_the_resolved_variant() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello").unwrap();

    let mock = mock();
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "web", "url": "/web", "method": "GET",
            "variants": [
                {"id": "api", "type": "json", "options": {"status": 200, "body": {"ok": true}}},
                {"id": "site", "type": "static", "options": {"path": dir.path().to_str().unwrap()}}
            ]
        }))],
        vec![collection("base", None, &["web:api"])],
    )
    .unwrap();

    // a json variant only answers its own url
    assert_eq!(get_body(&mock, "/web").await.as_deref(), Some(r#"{"ok":true}"#));
    assert!(get_body(&mock, "/web/any/deep/path").await.is_none());
    let outcome = mock
        .dispatch(MockRequest::new(Method::GET, "/web/hello.txt".parse().unwrap()))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DispatchOutcome::Unhandled(Unhandled::NoRouteMatched)
    ));

    mock.set_override("web:site").unwrap();
    assert_eq!(get_body(&mock, "/web/hello.txt").await.as_deref(), Some("hello"));

    mock.restore_overrides();
    assert!(get_body(&mock, "/web/hello.txt").await.is_none());
}

// =============================================================================
// Strict mode and registration
// =============================================================================

#[tokio::test]
async fn test_strict_mode_keeps_previous_model() {
    let mock = mock_with(MockOptions {
        strict: true,
        ..Default::default()
    });
    mock.load_definitions(three_routes(), vec![collection("base", None, &["r1:v1"])])
        .unwrap();

    let err = mock
        .load_definitions(
            vec![Value::from(json!({"id": "bad", "url": "/bad"}))],
            vec![collection("base", None, &[])],
        )
        .unwrap_err();
    assert!(matches!(err, MockError::InvalidDefinitions { count: 1 }));
    assert_eq!(mock.list_routes().len(), 3);
    assert_eq!(get_body(&mock, "/r1").await.as_deref(), Some("r1:v1"));
    assert!(alert_ids(&mock).contains(&"mock:routes:validation:bad".to_string()));
}

struct GreetingKind;

impl VariantHandlerKind for GreetingKind {
    fn id(&self) -> &str {
        "greeting"
    }

    fn build(&self, options: &Value, _: &VariantContext) -> Result<VariantHandler, HandlerError> {
        let name = options
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("world")
            .to_string();
        Ok(VariantHandler::request(Greeting(name)))
    }
}

struct Greeting(String);

#[async_trait::async_trait]
impl crate::variant_handlers::RequestHandler for Greeting {
    async fn handle(
        &self,
        _request: &MockRequest,
    ) -> Result<Option<crate::variant_handlers::MockResponse>, HandlerError> {
        respond(StatusCode::OK, None, &HeaderMap::new(), format!("hello {}", self.0)).map(Some)
    }
}

#[tokio::test]
async fn test_registering_a_kind_revalidates_loaded_definitions() {
    let mock = mock();
    mock.load_definitions(
        vec![Value::from(json!({
            "id": "greet", "url": "/greet", "method": "GET",
            "variants": [{"id": "hi", "type": "greeting", "options": {"name": "mock"}}]
        }))],
        vec![collection("base", None, &["greet:hi"])],
    )
    .unwrap();
    assert!(mock.list_routes().is_empty());

    let summary = mock
        .register_handler_kinds([Arc::new(GreetingKind) as Arc<dyn VariantHandlerKind>])
        .unwrap();
    assert_eq!(summary.routes, 1);
    assert_eq!(summary.invalid, 0);
    assert!(mock.handler_kinds().contains(&"greeting".to_string()));
    assert!(!alert_ids(&mock).iter().any(|id| id.starts_with("mock:routes")));
    assert_eq!(get_body(&mock, "/greet").await.as_deref(), Some("hello mock"));
}

#[test]
fn test_empty_registry_engine() {
    let mock = Mock::with_registry(
        VariantHandlerRegistry::new(),
        MockOptions::default(),
        Alerts::new("mock"),
    )
    .unwrap();
    let summary = mock
        .load_routes(vec![text_route("r1", "/r1", &["v1"])])
        .unwrap();
    assert_eq!(summary.routes, 0);
    assert!(mock.handler_kinds().is_empty());
}

#[tokio::test]
async fn test_reload_is_atomic_for_concurrent_requests() {
    let mock = Arc::new(mock());
    let version = |n: u32| {
        (
            vec![Value::from(json!({
                "id": "v", "url": "/version", "method": "GET",
                "variants": [{"id": "a", "type": "text", "options": {"status": 200, "body": format!("{n}")}}]
            }))],
            vec![collection("base", None, &["v:a"])],
        )
    };
    let (routes, collections) = version(0);
    mock.load_definitions(routes, collections).unwrap();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let mock = Arc::clone(&mock);
            tokio::spawn(async move {
                for _ in 0..50 {
                    let body = get_body(&mock, "/version").await;
                    assert!(body.is_some(), "request observed a partial model");
                }
            })
        })
        .collect();

    for n in 1..20 {
        let (routes, collections) = version(n);
        mock.load_definitions(routes, collections).unwrap();
        tokio::task::yield_now().await;
    }
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(get_body(&mock, "/version").await.as_deref(), Some("19"));
}
