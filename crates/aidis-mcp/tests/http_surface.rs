// aidis-mcp/tests/http_surface.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: In-process router tests for the HTTP contract.
// Purpose: Exercise status codes, envelopes, and headers without a network.
// Dependencies: aidis-mcp, axum, tower, http-body-util
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;

use aidis_mcp::AppState;
use aidis_mcp::SessionTracker;
use aidis_mcp::SseService;
use aidis_mcp::ToolRouter;
use aidis_mcp::ToolRouterConfig;
use aidis_mcp::build_router;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

/// Builds the app against a lazily connecting gateway.
fn test_app() -> Router {
    let config = aidis_config::AidisConfig::from_lookup(|name| match name {
        "AIDIS_DB_RETRY_ATTEMPTS" => Some("1".to_string()),
        "AIDIS_DB_CONNECT_TIMEOUT_MS" => Some("200".to_string()),
        _ => None,
    })
    .expect("config");
    let gateway = Arc::new(aidis_db::DbGateway::connect_lazy(&config.database).expect("gateway"));
    let sse = SseService::new(config.sse.clone());
    let router = ToolRouter::new(ToolRouterConfig {
        gateway: Arc::clone(&gateway),
        embedder: Arc::new(aidis_core::HashEmbeddingProvider::new(64)),
        active_projects: aidis_core::ActiveProjectStore::new(),
        tracker: Arc::new(SessionTracker::new(Arc::clone(&gateway))),
        sse: sse.clone(),
        disabled_tools: Vec::new(),
        request_timeout: std::time::Duration::from_secs(5),
    })
    .expect("router");
    build_router(
        AppState {
            router,
            sse,
            gateway,
        },
        &config.http,
    )
}

/// Reads a JSON response body.
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn healthz_reports_ok_with_the_versions_header() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-api-versions").and_then(|v| v.to_str().ok()),
        Some("v1,v2")
    );
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn tool_listing_covers_the_catalog() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/mcp/tools").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let tools = body["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), aidis_core::ToolName::all().len());
    assert!(tools.iter().all(|tool| tool.get("inputSchema").is_some()));
}

#[tokio::test]
async fn schema_listing_keys_by_tool_name() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder().uri("/mcp/tools/schemas").body(Body::empty()).expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["schemas"].get("context_store").is_some());
    assert!(body["schemas"].get("smart_search").is_some());
}

#[tokio::test]
async fn ping_round_trips_with_correlation_echo() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/tools/aidis_ping")
        .header("content-type", "application/json")
        .header("x-correlation-id", "req-123")
        .body(Body::from(r#"{"arguments":{"message":"hello"}}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-correlation-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["requestId"], json!("req-123"));
    assert_eq!(body["version"], json!("v1"));
    assert_eq!(body["data"]["message"], json!("hello"));
}

#[tokio::test]
async fn v2_reports_its_version() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v2/mcp/tools/aidis_ping")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"arguments":{}}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], json!("v2"));
}

#[tokio::test]
async fn unknown_tools_return_404() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/tools/no_such_tool")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"arguments":{}}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("ToolNotFound"));
}

#[tokio::test]
async fn validation_failures_return_400_naming_the_field() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/tools/context_search")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"arguments":{"query":"x","limit":500}}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("InvalidInput"));
    assert!(body["error"].as_str().expect("message").contains("limit"));
}

#[tokio::test]
async fn malformed_bodies_return_400() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/tools/aidis_ping")
        .header("content-type", "application/json")
        .body(Body::from("{broken"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_methods_return_405() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/mcp/tools/aidis_ping")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("MethodNotAllowed"));
}

#[tokio::test]
async fn oversized_bodies_return_413() {
    let app = test_app();
    let oversized = format!(
        r#"{{"arguments":{{"message":"{}"}}}}"#,
        "x".repeat(2 * 1024 * 1024)
    );
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/tools/aidis_ping")
        .header("content-type", "application/json")
        .body(Body::from(oversized))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unknown_paths_return_404() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_require_a_principal() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/events").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn events_reject_unknown_entity_filters() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/events?entities=invalid,tasks")
                .header("x-user-id", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().expect("message").contains("invalid"));
}

#[tokio::test]
async fn events_stream_with_no_buffering_headers() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/events?entities=tasks")
                .header("x-user-id", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
    assert_eq!(headers.get("cache-control").and_then(|v| v.to_str().ok()), Some("no-cache"));
    assert_eq!(headers.get("x-accel-buffering").and_then(|v| v.to_str().ok()), Some("no"));
}

#[tokio::test]
async fn sixth_stream_for_one_user_returns_503() {
    let config = aidis_config::AidisConfig::from_lookup(|_| None).expect("config");
    let gateway = Arc::new(aidis_db::DbGateway::connect_lazy(&config.database).expect("gateway"));
    let sse = SseService::new(config.sse.clone());
    let router = ToolRouter::new(ToolRouterConfig {
        gateway: Arc::clone(&gateway),
        embedder: Arc::new(aidis_core::HashEmbeddingProvider::new(64)),
        active_projects: aidis_core::ActiveProjectStore::new(),
        tracker: Arc::new(SessionTracker::new(Arc::clone(&gateway))),
        sse: sse.clone(),
        disabled_tools: Vec::new(),
        request_timeout: std::time::Duration::from_secs(5),
    })
    .expect("router");
    let app = build_router(
        AppState {
            router,
            sse,
            gateway,
        },
        &config.http,
    );
    let mut held = Vec::new();
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/events")
                    .header("x-user-id", "alice")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        held.push(response);
    }
    let sixth = app
        .oneshot(
            Request::builder()
                .uri("/events")
                .header("x-user-id", "alice")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(sixth.status(), StatusCode::SERVICE_UNAVAILABLE);
}
