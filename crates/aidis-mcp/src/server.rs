// aidis-mcp/src/server.rs
// ============================================================================
// Module: HTTP Surface
// Description: Axum router for health, tool listing, invocation, and SSE.
// Purpose: The versioned HTTP API in front of the dispatcher.
// Dependencies: aidis-core, aidis-contract, axum, tower-http, serde_json
// ============================================================================

//! ## Overview
//! Every request gets a correlation id, echoed from `X-Correlation-ID` or
//! generated, and every response carries the supported-versions header.
//! `/mcp/tools/{name}` and `/v2/mcp/tools/{name}` share one dispatcher;
//! the only difference is the `version` field in the envelope. The SSE
//! endpoint authenticates an opaque principal and validates filters
//! before a subscriber entry exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use aidis_config::HttpConfig;
use aidis_core::ApiVersion;
use aidis_core::CorrelationId;
use aidis_core::EntityKind;
use aidis_core::ProjectId;
use aidis_db::DbGateway;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::routing::get;
use axum::routing::post;
use chrono::Utc;
use serde_json::Value;
use serde_json::json;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::sse::SseService;
use crate::sse::SubscriberFilter;
use crate::tools::DispatchContext;
use crate::tools::ToolRouter;
use crate::tools::session::parse_session;

/// Header carrying the client's correlation id.
const CORRELATION_HEADER: &str = "x-correlation-id";
/// Header identifying the authenticated principal.
const USER_HEADER: &str = "x-user-id";
/// Header carrying the client's session id.
const SESSION_HEADER: &str = "x-session-id";
/// Header advertising the supported API versions.
const VERSIONS_HEADER: &str = "x-api-versions";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    /// Tool dispatcher.
    pub router: ToolRouter,
    /// SSE fan-out service.
    pub sse: SseService,
    /// Database gateway, for readiness probes.
    pub gateway: Arc<DbGateway>,
}

// ============================================================================
// SECTION: Router Assembly
// ============================================================================

/// Builds the application router.
#[must_use]
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    let cors = cors_layer(config);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/mcp/tools", get(list_tools))
        .route("/mcp/tools/schemas", get(list_schemas))
        .route("/mcp/tools/{name}", post(invoke_v1))
        .route("/v2/mcp/tools/{name}", post(invoke_v2))
        .route("/events", get(subscribe_events))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .with_state(state)
}

/// Builds the CORS layer; permissive by default.
fn cors_layer(config: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if config.cors_origin == "*" {
        layer.allow_origin(Any)
    } else if let Ok(origin) = HeaderValue::from_str(&config.cors_origin) {
        layer.allow_origin(origin)
    } else {
        layer.allow_origin(Any)
    }
}

// ============================================================================
// SECTION: Health Endpoints
// ============================================================================

/// Liveness: the process accepts connections.
async fn healthz() -> Response {
    json_response(
        StatusCode::OK,
        json!({ "status": "ok", "timestamp": Utc::now() }),
    )
}

/// Readiness: the gateway answers and the breaker is not open.
async fn readyz(State(state): State<AppState>) -> Response {
    let breaker = state.gateway.breaker().state();
    if breaker == aidis_db::BreakerState::Open {
        return json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "unavailable", "reason": "circuit breaker open", "timestamp": Utc::now() }),
        );
    }
    let correlation_id = CorrelationId::generate();
    match state.gateway.health_probe(&correlation_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            json!({ "status": "ready", "breaker": breaker.as_str(), "timestamp": Utc::now() }),
        ),
        Err(error) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "unavailable", "reason": error.to_string(), "timestamp": Utc::now() }),
        ),
    }
}

// ============================================================================
// SECTION: Tool Listing
// ============================================================================

/// Lists tool descriptors.
async fn list_tools() -> Response {
    let tools = aidis_contract::tool_definitions();
    let count = tools.len();
    json_response(StatusCode::OK, json!({ "tools": tools, "count": count }))
}

/// Lists full input schemas keyed by tool name.
async fn list_schemas() -> Response {
    let mut schemas = serde_json::Map::new();
    for tool in aidis_core::ToolName::all() {
        schemas.insert(tool.as_str().to_string(), aidis_contract::input_schema(*tool));
    }
    json_response(StatusCode::OK, json!({ "schemas": schemas }))
}

// ============================================================================
// SECTION: Tool Invocation
// ============================================================================

/// Request body for tool invocation.
#[derive(Debug, serde::Deserialize)]
struct InvokeBody {
    /// Tool arguments object.
    arguments: Option<Value>,
}

/// Invokes a tool on the legacy surface.
async fn invoke_v1(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    invoke(state, name, headers, body, ApiVersion::V1).await
}

/// Invokes a tool on the versioned surface.
async fn invoke_v2(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    invoke(state, name, headers, body, ApiVersion::V2).await
}

/// Shared invocation path for both API versions.
async fn invoke(
    state: AppState,
    name: String,
    headers: HeaderMap,
    body: Bytes,
    version: ApiVersion,
) -> Response {
    let context = dispatch_context(&headers, version);
    let arguments = match parse_arguments(&body) {
        Ok(arguments) => arguments,
        Err(message) => {
            let error = aidis_core::ToolError::InvalidInput(message);
            let envelope = aidis_core::ErrorEnvelope::new(
                &error,
                version,
                context.correlation_id.as_str(),
                0,
            );
            return envelope_response(
                StatusCode::BAD_REQUEST,
                serde_json::to_value(&envelope).unwrap_or_default(),
                &context.correlation_id,
            );
        }
    };
    let outcome = state.router.dispatch(&context, &name, &arguments).await;
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    envelope_response(status, outcome.body, &context.correlation_id)
}

/// Parses the invocation body into the arguments object.
fn parse_arguments(body: &Bytes) -> Result<Value, String> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    let parsed: InvokeBody = serde_json::from_slice(body)
        .map_err(|error| format!("request body is not valid JSON: {error}"))?;
    Ok(parsed.arguments.unwrap_or_else(|| json!({})))
}

/// Builds the execution context from request headers.
fn dispatch_context(headers: &HeaderMap, version: ApiVersion) -> DispatchContext {
    let correlation_id = headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(CorrelationId::generate, CorrelationId::new);
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_session);
    DispatchContext {
        correlation_id,
        session_id,
        principal: principal_from(headers),
        version,
    }
}

/// Resolves the opaque principal from headers.
fn principal_from(headers: &HeaderMap) -> Option<String> {
    if let Some(user) = headers.get(USER_HEADER).and_then(|value| value.to_str().ok())
        && !user.is_empty()
    {
        return Some(user.to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// ============================================================================
// SECTION: SSE Endpoint
// ============================================================================

/// Subscribes the caller to the change-event stream.
async fn subscribe_events(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = principal_from(&headers) else {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "error": "authentication required", "code": "Unauthorized" }),
        );
    };
    let project_id = match params.get("projectId") {
        Some(raw) => match ProjectId::parse(raw) {
            Some(id) => Some(id),
            None => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    json!({ "success": false, "error": format!("invalid projectId: {raw}"), "code": "InvalidInput" }),
                );
            }
        },
        None => None,
    };
    let entities = match params.get("entities") {
        Some(raw) => match parse_entities(raw) {
            Ok(entities) => Some(entities),
            Err(invalid) => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    json!({ "success": false, "error": format!("unknown entity: {invalid}"), "code": "InvalidInput" }),
                );
            }
        },
        None => None,
    };
    let filter = SubscriberFilter {
        project_id,
        entities,
    };
    match state.sse.subscribe(user_id, filter) {
        Ok(subscription) => {
            let mut response = Sse::new(subscription).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
            response
        }
        Err(error) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "success": false, "error": error.to_string(), "code": "TooManyConnections" }),
        ),
    }
}

/// Parses the comma-separated entity filter.
fn parse_entities(raw: &str) -> Result<Vec<EntityKind>, String> {
    let mut entities = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let kind = EntityKind::parse(entry).ok_or_else(|| entry.to_string())?;
        if !entities.contains(&kind) {
            entities.push(kind);
        }
    }
    Ok(entities)
}

// ============================================================================
// SECTION: Fallbacks and Responses
// ============================================================================

/// Fallback for unknown paths.
async fn not_found() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "success": false, "error": "unknown endpoint", "code": "NotFound" }),
    )
}

/// Fallback for wrong methods on known paths.
async fn method_not_allowed() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({ "success": false, "error": "method not allowed", "code": "MethodNotAllowed" }),
    )
}

/// Serializes a JSON response with the versions header.
fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = (status, axum::Json(body)).into_response();
    response
        .headers_mut()
        .insert(VERSIONS_HEADER, HeaderValue::from_static(ApiVersion::supported()));
    response
}

/// Serializes an envelope response, echoing the correlation id.
fn envelope_response(status: StatusCode, body: Value, correlation_id: &CorrelationId) -> Response {
    let mut response = json_response(status, body);
    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use aidis_core::ApiVersion;
    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use bytes::Bytes;

    use super::dispatch_context;
    use super::parse_arguments;
    use super::parse_entities;
    use super::principal_from;

    #[test]
    fn correlation_id_is_echoed_from_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static("req-7"));
        let context = dispatch_context(&headers, ApiVersion::V2);
        assert_eq!(context.correlation_id.as_str(), "req-7");
    }

    #[test]
    fn correlation_id_is_generated_when_absent() {
        let context = dispatch_context(&HeaderMap::new(), ApiVersion::V1);
        assert!(!context.correlation_id.as_str().is_empty());
    }

    #[test]
    fn principal_prefers_the_user_header_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("alice"));
        headers.insert("authorization", HeaderValue::from_static("Bearer tok"));
        assert_eq!(principal_from(&headers), Some("alice".to_string()));
        headers.remove("x-user-id");
        assert_eq!(principal_from(&headers), Some("tok".to_string()));
        headers.remove("authorization");
        assert_eq!(principal_from(&headers), None);
    }

    #[test]
    fn empty_bodies_default_to_empty_arguments() {
        assert_eq!(parse_arguments(&Bytes::new()).expect("parse"), serde_json::json!({}));
    }

    #[test]
    fn argument_objects_pass_through() {
        let body = Bytes::from(r#"{"arguments":{"query":"x"}}"#);
        let parsed = parse_arguments(&body).expect("parse");
        assert_eq!(parsed["query"], serde_json::json!("x"));
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(parse_arguments(&Bytes::from("{nope")).is_err());
    }

    #[test]
    fn entity_filters_parse_and_reject_unknowns() {
        let entities = parse_entities("tasks,contexts").expect("parse");
        assert_eq!(entities.len(), 2);
        let error = parse_entities("invalid,tasks").expect_err("must fail");
        assert_eq!(error, "invalid");
    }
}
