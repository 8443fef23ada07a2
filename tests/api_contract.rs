// API Contract Tests
//
// These tests drive the full router (routes, CORS, preflight, fallbacks)
// in-process and pin the exact status codes and bodies clients rely on.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chaos_registry::registry::{DuplicatePolicy, Registry};
use chaos_registry::server::{app, AppState, ServerConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn quiet_config() -> ServerConfig {
    ServerConfig {
        seed_samples: false,
        enable_logging: false,
        ..Default::default()
    }
}

fn test_app() -> Router {
    app(AppState::new(Registry::new(), quiet_config()))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("body should be JSON")
    }
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    Reply {
        status,
        headers,
        body,
    }
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<&str>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request should build");
    send(app, request).await
}

const CPU_HOG: &str =
    r#"{"name":"x","namespace":"ns1","experimentType":"cpu-hog","targetKind":"Pod","targetName":"p1"}"#;

// ============================================================================
// LIST / CREATE
// ============================================================================

#[tokio::test]
async fn test_list_starts_empty() {
    let app = test_app();
    let reply = call(&app, Method::GET, "/api/experiments", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!([]));
    assert_eq!(
        reply.headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"application/json"[..])
    );
}

#[tokio::test]
async fn test_create_forces_pending_state() {
    let app = test_app();
    let reply = call(&app, Method::POST, "/api/experiments", Some(CPU_HOG)).await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        reply.json(),
        json!({
            "name": "x",
            "namespace": "ns1",
            "experimentType": "cpu-hog",
            "targetKind": "Pod",
            "targetName": "p1",
            "status": "Pending",
            "startTime": null,
            "endTime": null,
            "message": "Waiting to start",
        })
    );
}

#[tokio::test]
async fn test_create_discards_client_server_fields() {
    let app = test_app();
    let body = json!({
        "name": "x",
        "namespace": "ns1",
        "status": "Completed",
        "startTime": "2024-01-01T00:00:00Z",
        "endTime": "2024-01-01T00:05:00Z",
        "message": "done already",
    })
    .to_string();

    let reply = call(&app, Method::POST, "/api/experiments", Some(&body)).await;
    let record = reply.json();

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(record["status"], "Pending");
    assert_eq!(record["startTime"], Value::Null);
    assert_eq!(record["endTime"], Value::Null);
    assert_eq!(record["message"], "Waiting to start");
}

#[tokio::test]
async fn test_create_round_trips_client_fields() {
    let app = test_app();
    let submitted = json!({
        "name": "lat",
        "namespace": "ns1",
        "experimentType": "network-latency",
        "targetKind": "Deployment",
        "targetName": "web",
        "duration": "5m",
        "parameters": {"latency": "250ms"},
        "owner": "sre-team",
    });

    let reply = call(&app, Method::POST, "/api/experiments", Some(&submitted.to_string())).await;
    let mut record = reply.json();
    let object = record.as_object_mut().expect("record is an object");
    for key in ["status", "startTime", "endTime", "message"] {
        object.remove(key);
    }

    assert_eq!(record, submitted);
}

#[tokio::test]
async fn test_list_returns_creation_order() {
    let app = test_app();
    for name in ["c", "a", "b"] {
        let body = json!({"name": name, "namespace": "ns1"}).to_string();
        let reply = call(&app, Method::POST, "/api/experiments", Some(&body)).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let first = call(&app, Method::GET, "/api/experiments", None).await;
    let names: Vec<Value> = first
        .json()
        .as_array()
        .expect("list is an array")
        .iter()
        .map(|record| record["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);

    let second = call(&app, Method::GET, "/api/experiments", None).await;
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_create_without_content_type() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/experiments")
        .body(Body::from(CPU_HOG))
        .expect("request should build");

    assert_eq!(send(&app, request).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_invalid_json() {
    let app = test_app();
    for body in ["{not json", "", "{\"name\": ", "nul", "[1,2"] {
        let reply = call(&app, Method::POST, "/api/experiments", Some(body)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "body: {:?}", body);
        assert_eq!(reply.json(), json!({"error": "Invalid JSON"}));
    }

    let list = call(&app, Method::GET, "/api/experiments", None).await;
    assert_eq!(list.json(), json!([]));
}

#[tokio::test]
async fn test_create_keeps_non_string_values() {
    let app = test_app();
    let submitted = [
        json!({"name": "x", "namespace": "ns1", "parameters": {"cpuCores": 2}}),
        json!({"name": "y", "namespace": "ns1", "duration": 60}),
        json!({"name": "z", "namespace": "ns1", "parameters": null}),
        json!({"namespace": "ns1", "experimentType": "cpu-hog"}),
    ];

    for body in &submitted {
        let reply = call(&app, Method::POST, "/api/experiments", Some(&body.to_string())).await;
        assert_eq!(reply.status, StatusCode::CREATED, "body: {}", body);

        let mut record = reply.json();
        let object = record.as_object_mut().expect("record is an object");
        assert_eq!(object.remove("status"), Some(json!("Pending")));
        assert_eq!(object.remove("startTime"), Some(Value::Null));
        assert_eq!(object.remove("endTime"), Some(Value::Null));
        assert_eq!(object.remove("message"), Some(json!("Waiting to start")));
        assert_eq!(&record, body);
    }

    let found = call(&app, Method::GET, "/api/experiments/ns1/y", None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.json()["duration"], 60);

    let list = call(&app, Method::GET, "/api/experiments", None).await;
    assert_eq!(list.json().as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_create_with_non_object_json() {
    let app = test_app();
    for body in ["[1,2]", "\"text\"", "42", "null"] {
        let reply = call(&app, Method::POST, "/api/experiments", Some(body)).await;
        assert_eq!(reply.status, StatusCode::CREATED, "body: {:?}", body);
        assert_eq!(
            reply.json(),
            json!({
                "status": "Pending",
                "startTime": null,
                "endTime": null,
                "message": "Waiting to start",
            })
        );
    }
}

// ============================================================================
// GET / DELETE
// ============================================================================

#[tokio::test]
async fn test_get_after_create() {
    let app = test_app();
    call(&app, Method::POST, "/api/experiments", Some(CPU_HOG)).await;

    let reply = call(&app, Method::GET, "/api/experiments/ns1/x", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["namespace"], "ns1");
    assert_eq!(reply.json()["name"], "x");
}

#[tokio::test]
async fn test_get_missing() {
    let app = test_app();
    let reply = call(&app, Method::GET, "/api/experiments/ns1/missing", None).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json(), json!({"error": "Experiment not found"}));
}

#[tokio::test]
async fn test_delete_then_get() {
    let app = test_app();
    call(&app, Method::POST, "/api/experiments", Some(CPU_HOG)).await;

    let deleted = call(&app, Method::DELETE, "/api/experiments/ns1/x", None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_empty());

    let missing = call(&app, Method::GET, "/api/experiments/ns1/x", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json(), json!({"error": "Experiment not found"}));

    let again = call(&app, Method::DELETE, "/api/experiments/ns1/x", None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.json(), json!({"error": "Experiment not found"}));
}

#[tokio::test]
async fn test_segments_are_literal() {
    let app = test_app();
    for name in ["a%20b", "a b"] {
        let body = json!({"name": name, "namespace": "ns1"}).to_string();
        call(&app, Method::POST, "/api/experiments", Some(&body)).await;
    }

    let literal = call(&app, Method::GET, "/api/experiments/ns1/a%20b", None).await;
    assert_eq!(literal.status, StatusCode::OK);
    assert_eq!(literal.json()["name"], "a%20b");

    let deleted = call(&app, Method::DELETE, "/api/experiments/ns1/a%20b", None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let decoded = call(&app, Method::GET, "/api/experiments/ns1/a%20b", None).await;
    assert_eq!(decoded.status, StatusCode::NOT_FOUND);
    assert_eq!(decoded.json(), json!({"error": "Experiment not found"}));
}

#[tokio::test]
async fn test_undecodable_segments_are_not_found() {
    let app = test_app();
    for method in [Method::GET, Method::DELETE] {
        for uri in ["/api/experiments/ns1/%FF", "/api/experiments/%C3%28/x"] {
            let reply = call(&app, method.clone(), uri, None).await;
            assert_eq!(reply.status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(
                reply.json(),
                json!({"error": "Experiment not found"}),
                "{} {}",
                method,
                uri
            );
        }
    }
}

#[tokio::test]
async fn test_duplicates_resolve_first_by_default() {
    let app = test_app();
    let first = json!({"name": "x", "namespace": "ns1", "duration": "1m"}).to_string();
    let second = json!({"name": "x", "namespace": "ns1", "duration": "5m"}).to_string();
    call(&app, Method::POST, "/api/experiments", Some(&first)).await;
    let reply = call(&app, Method::POST, "/api/experiments", Some(&second)).await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let found = call(&app, Method::GET, "/api/experiments/ns1/x", None).await;
    assert_eq!(found.json()["duration"], "1m");
}

#[tokio::test]
async fn test_duplicates_rejected_under_policy() {
    let config = ServerConfig {
        duplicate_policy: DuplicatePolicy::Reject,
        ..quiet_config()
    };
    let app = app(AppState::new(
        Registry::with_policy(DuplicatePolicy::Reject),
        config,
    ));

    call(&app, Method::POST, "/api/experiments", Some(CPU_HOG)).await;
    let reply = call(&app, Method::POST, "/api/experiments", Some(CPU_HOG)).await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json(), json!({"error": "Experiment already exists"}));

    let list = call(&app, Method::GET, "/api/experiments", None).await;
    assert_eq!(list.json().as_array().map(Vec::len), Some(1));
}

// ============================================================================
// FALLBACKS / CORS
// ============================================================================

#[tokio::test]
async fn test_unmatched_routes() {
    let app = test_app();
    let cases = [
        (Method::GET, "/"),
        (Method::GET, "/api/unknown"),
        (Method::GET, "/api/experiments/"),
        (Method::GET, "/api/experiments/ns1"),
        (Method::GET, "/api/experiments/ns1/x/extra"),
        (Method::PUT, "/api/experiments"),
        (Method::DELETE, "/api/experiments"),
        (Method::POST, "/api/experiments/ns1/x"),
        (Method::PATCH, "/api/experiments/ns1/x"),
    ];

    for (method, uri) in cases {
        let reply = call(&app, method.clone(), uri, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(reply.json(), json!({"error": "Not found"}), "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_preflight_is_no_content() {
    let app = test_app();
    for uri in ["/api/experiments", "/api/experiments/ns1/x", "/anything/else"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .body(Body::empty())
            .expect("request should build");

        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::NO_CONTENT, "{}", uri);
        assert!(reply.body.is_empty());
        assert_eq!(
            reply
                .headers
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .map(|v| v.as_bytes()),
            Some(&b"*"[..])
        );
    }
}

#[tokio::test]
async fn test_bare_options_is_no_content() {
    let app = test_app();
    let reply = call(&app, Method::OPTIONS, "/api/experiments/ns1/x", None).await;

    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_cors_header_on_responses() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/experiments")
        .header(header::ORIGIN, "http://dashboard.example")
        .body(Body::empty())
        .expect("request should build");

    let reply = send(&app, request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply
            .headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.as_bytes()),
        Some(&b"*"[..])
    );
}

// ============================================================================
// STATIC DASHBOARD
// ============================================================================

#[tokio::test]
async fn test_static_dir_serves_dashboard() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("index.html"), "<html>dashboard</html>").expect("write index");

    let config = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..quiet_config()
    };
    let app = app(AppState::new(Registry::new(), config));

    let index = call(&app, Method::GET, "/index.html", None).await;
    assert_eq!(index.status, StatusCode::OK);
    assert_eq!(&index.body[..], b"<html>dashboard</html>");

    let missing = call(&app, Method::GET, "/static/js/missing.js", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json(), json!({"error": "Not found"}));

    let posted = call(&app, Method::POST, "/index.html", Some("{}")).await;
    assert_eq!(posted.status, StatusCode::NOT_FOUND);
    assert_eq!(posted.json(), json!({"error": "Not found"}));

    let api = call(&app, Method::GET, "/api/experiments", None).await;
    assert_eq!(api.status, StatusCode::OK);
}

#[tokio::test]
async fn test_seeded_registry_lists_samples() {
    let app = app(AppState::new(
        Registry::seeded(DuplicatePolicy::Allow, chrono::Utc::now()),
        quiet_config(),
    ));

    let reply = call(&app, Method::GET, "/api/experiments", None).await;
    let records = reply.json();
    let statuses: Vec<&str> = records
        .as_array()
        .expect("list is an array")
        .iter()
        .filter_map(|record| record["status"].as_str())
        .collect();

    assert_eq!(statuses, vec!["Completed", "Running", "Pending"]);
}
