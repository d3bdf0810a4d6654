// aidis-mcp/tests/db_scenarios.rs
// ============================================================================
// Module: Database Scenario Tests
// Description: End-to-end tool flows against a live Postgres.
// Purpose: Exercise every tool group through the dispatcher.
// Dependencies: aidis-mcp, sqlx, tokio
// ============================================================================

//! ## Overview
//! These tests need a real database with the pgvector extension. They are
//! gated on `AIDIS_TEST_DATABASE_URL` and skip silently when it is unset,
//! so the default `cargo test` run stays hermetic. The reference schema is
//! applied once per process before the first scenario.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;

use aidis_mcp::DispatchContext;
use aidis_mcp::SessionTracker;
use aidis_mcp::SseService;
use aidis_mcp::ToolRouter;
use aidis_mcp::ToolRouterConfig;
use serde_json::Value;
use serde_json::json;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Reference schema applied before the first scenario.
const SCHEMA_SQL: &str = include_str!("../../aidis-db/schema.sql");

/// One-shot schema setup shared by every test in the process.
static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

/// Applies the reference schema exactly once.
async fn ensure_schema(url: &str) {
    SCHEMA_APPLIED
        .get_or_init(|| async {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(2)
                .connect(url)
                .await
                .expect("schema pool");
            sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await.expect("apply schema");
            pool.close().await;
        })
        .await;
}

/// Builds a router against the gated test database, or skips.
async fn test_router() -> Option<ToolRouter> {
    let url = std::env::var("AIDIS_TEST_DATABASE_URL").ok()?;
    ensure_schema(&url).await;
    let config = aidis_config::AidisConfig::from_lookup(move |name| match name {
        "DATABASE_URL" => Some(url.clone()),
        _ => None,
    })
    .expect("config");
    let gateway =
        Arc::new(aidis_db::DbGateway::connect(&config.database).await.expect("connect"));
    let sse = SseService::new(config.sse.clone());
    Some(
        ToolRouter::new(ToolRouterConfig {
            gateway: Arc::clone(&gateway),
            embedder: Arc::new(aidis_core::HashEmbeddingProvider::new(384)),
            active_projects: aidis_core::ActiveProjectStore::new(),
            tracker: Arc::new(SessionTracker::new(gateway)),
            sse,
            disabled_tools: Vec::new(),
            request_timeout: std::time::Duration::from_secs(10),
        })
        .expect("router"),
    )
}

fn context() -> DispatchContext {
    DispatchContext {
        correlation_id: aidis_core::CorrelationId::generate(),
        session_id: None,
        principal: Some("integration-tests".to_string()),
        version: aidis_core::ApiVersion::V2,
    }
}

async fn call(router: &ToolRouter, ctx: &DispatchContext, tool: &str, arguments: Value) -> Value {
    let outcome = router.dispatch(ctx, tool, &arguments).await;
    assert_eq!(
        outcome.status, 200,
        "{tool} failed: {}",
        outcome.body
    );
    outcome.body["data"].clone()
}

/// Creates a uniquely named project and switches the session onto it.
async fn fresh_project(router: &ToolRouter, ctx: &DispatchContext, prefix: &str) -> String {
    let name = format!("{prefix}-{}", Uuid::new_v4());
    call(router, ctx, "project_create", json!({ "name": name.as_str() })).await;
    call(router, ctx, "project_switch", json!({ "project": name.as_str() })).await;
    name
}

// ============================================================================
// SECTION: Context Scenarios
// ============================================================================

#[tokio::test]
async fn store_and_find_round_trip() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "alpha").await;
    let stored = call(
        &router,
        &ctx,
        "context_store",
        json!({ "type": "code", "content": "use a red-black tree", "tags": ["ds"] }),
    )
    .await;
    let stored_id = stored["id"].as_str().expect("stored id").to_string();
    let found = call(
        &router,
        &ctx,
        "context_search",
        json!({ "query": "use a red-black tree", "limit": 5 }),
    )
    .await;
    let results = found["results"].as_array().expect("results");
    assert!(!results.is_empty(), "search returned nothing");
    assert_eq!(results[0]["id"].as_str(), Some(stored_id.as_str()));
    let similarity = results[0]["similarity"].as_f64().expect("similarity");
    assert!(similarity >= 80.0, "similarity too low: {similarity}");

    let recent = call(&router, &ctx, "context_get_recent", json!({})).await;
    let contexts = recent["contexts"].as_array().expect("contexts");
    assert!(contexts.iter().any(|c| c["id"].as_str() == Some(stored_id.as_str())));

    let stats = call(&router, &ctx, "context_stats", json!({})).await;
    assert!(stats["total"].as_i64().expect("total") >= 1);
    assert!(stats["byType"]["code"].as_i64().expect("code count") >= 1);
}

#[tokio::test]
async fn zero_limit_searches_return_empty() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "zl").await;
    let found =
        call(&router, &ctx, "context_search", json!({ "query": "anything", "limit": 0 })).await;
    assert_eq!(found["results"].as_array().map(Vec::len), Some(0));
}

// ============================================================================
// SECTION: System Scenarios
// ============================================================================

#[tokio::test]
async fn system_tools_report_health_and_catalog() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    let pong = call(&router, &ctx, "aidis_ping", json!({})).await;
    assert_eq!(pong["message"], json!("pong"));

    let status = call(&router, &ctx, "aidis_status", json!({})).await;
    assert_eq!(status["status"], json!("ok"));
    assert_eq!(status["database"]["status"], json!("healthy"));
    assert_eq!(status["database"]["breaker"], json!("closed"));

    let help = call(&router, &ctx, "aidis_help", json!({ "category": "agent" })).await;
    let tools = help["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), 8);
}

// ============================================================================
// SECTION: Naming Scenarios
// ============================================================================

#[tokio::test]
async fn naming_conflicts_surface_as_409_and_check_reports_them() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "nm").await;
    call(
        &router,
        &ctx,
        "naming_register",
        json!({ "entityType": "class", "canonicalName": "UserService" }),
    )
    .await;
    let duplicate = router
        .dispatch(
            &ctx,
            "naming_register",
            &json!({ "entityType": "class", "canonicalName": "UserService" }),
        )
        .await;
    assert_eq!(duplicate.status, 409, "expected conflict: {}", duplicate.body);
    assert_eq!(duplicate.body["code"], json!("NamingConflict"));
    let check = call(
        &router,
        &ctx,
        "naming_check",
        json!({ "entityType": "class", "proposedName": "UserService" }),
    )
    .await;
    let conflicts = check["conflicts"].as_array().expect("conflicts");
    assert!(conflicts.iter().any(|c| {
        c["type"] == json!("exact_match") && c["severity"] == json!("error")
    }));
}

#[tokio::test]
async fn naming_suggest_and_stats_cover_the_registry() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "ns").await;
    call(
        &router,
        &ctx,
        "naming_register",
        json!({ "entityType": "class", "canonicalName": "UserService" }),
    )
    .await;
    let suggested = call(
        &router,
        &ctx,
        "naming_suggest",
        json!({ "entityType": "class", "description": "a cache for user sessions" }),
    )
    .await;
    let suggestions = suggested["suggestions"].as_array().expect("suggestions");
    assert!(!suggestions.is_empty());
    for suggestion in suggestions {
        let name = suggestion.as_str().expect("suggestion");
        assert!(name.chars().next().expect("non-empty").is_ascii_uppercase(), "{name}");
        assert_ne!(name, "UserService");
    }
    let stats = call(&router, &ctx, "naming_stats", json!({})).await;
    assert!(stats["total"].as_i64().expect("total") >= 1);
    assert!(stats["byType"]["class"].as_i64().expect("class count") >= 1);
}

// ============================================================================
// SECTION: Project and Session Scenarios
// ============================================================================

#[tokio::test]
async fn project_switch_then_current_round_trips() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    let name = format!("cur-{}", Uuid::new_v4());
    call(&router, &ctx, "project_create", json!({ "name": name.as_str() })).await;
    let switched = call(&router, &ctx, "project_switch", json!({ "project": name.as_str() })).await;
    let current = call(&router, &ctx, "project_current", json!({})).await;
    assert_eq!(current["project"]["id"], switched["project"]["id"]);
}

#[tokio::test]
async fn session_lifecycle_round_trips() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    let name = format!("sess-{}", Uuid::new_v4());
    call(&router, &ctx, "project_create", json!({ "name": name.as_str() })).await;

    let created = call(&router, &ctx, "session_new", json!({ "title": "focus block" })).await;
    let session_id = created["session"]["id"].as_str().expect("session id").to_string();

    let status = call(&router, &ctx, "session_status", json!({})).await;
    assert_eq!(status["session"]["id"].as_str(), Some(session_id.as_str()));

    let assigned = call(&router, &ctx, "session_assign", json!({ "project": name.as_str() })).await;
    assert_eq!(assigned["project"]["name"], json!(name.as_str()));
    assert_eq!(assigned["sessionId"].as_str(), Some(session_id.as_str()));

    let scored =
        call(&router, &ctx, "session_update", json!({ "productivityScore": 80.0 })).await;
    assert_eq!(scored["session"]["productivity_score"].as_f64(), Some(80.0));
    assert!(scored["session"]["ended_at"].is_null());

    let ended = call(&router, &ctx, "session_update", json!({ "ended": true })).await;
    assert!(ended["session"]["ended_at"].is_string());

    let after = call(&router, &ctx, "session_status", json!({})).await;
    assert!(after["session"].is_null(), "tracker must forget the closed session");
}

// ============================================================================
// SECTION: Decision Scenarios
// ============================================================================

#[tokio::test]
async fn decision_lifecycle_round_trips() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "dec").await;
    let recorded = call(
        &router,
        &ctx,
        "decision_record",
        json!({
            "title": "Adopt sqlx for the gateway",
            "problem": "the store blocks the runtime",
            "decision": "move every query onto sqlx",
            "impactLevel": "high",
            "alternatives": [
                { "name": "keep r2d2", "description": "stay synchronous", "cons": ["blocks"] }
            ]
        }),
    )
    .await;
    let decision_id = recorded["id"].as_str().expect("decision id").to_string();
    assert_eq!(recorded["status"], json!("active"));
    assert_eq!(recorded["impact_level"], json!("high"));
    assert_eq!(recorded["alternatives"].as_array().map(Vec::len), Some(1));

    let found = call(&router, &ctx, "decision_search", json!({ "query": "sqlx" })).await;
    let decisions = found["decisions"].as_array().expect("decisions");
    assert!(decisions.iter().any(|d| d["id"].as_str() == Some(decision_id.as_str())));

    let updated = call(
        &router,
        &ctx,
        "decision_update",
        json!({ "decisionId": decision_id, "status": "superseded", "rationale": "replaced" }),
    )
    .await;
    assert_eq!(updated["status"], json!("superseded"));
    assert_eq!(updated["rationale"], json!("replaced"));

    let stats = call(&router, &ctx, "decision_stats", json!({})).await;
    assert!(stats["total"].as_i64().expect("total") >= 1);
    assert!(stats["byStatus"]["superseded"].as_i64().expect("superseded") >= 1);
    assert!(stats["byImpact"]["high"].as_i64().expect("high") >= 1);
}

// ============================================================================
// SECTION: Agent Scenarios
// ============================================================================

#[tokio::test]
async fn agent_coordination_round_trips() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "ag").await;
    let scout = format!("scout-{}", Uuid::new_v4());

    let registered = call(
        &router,
        &ctx,
        "agent_register",
        json!({ "name": scout.as_str(), "type": "ai_assistant", "capabilities": ["review"] }),
    )
    .await;
    assert_eq!(registered["name"].as_str(), Some(scout.as_str()));
    assert_eq!(registered["status"], json!("active"));

    let listed = call(&router, &ctx, "agent_list", json!({})).await;
    let agents = listed["agents"].as_array().expect("agents");
    assert!(agents.iter().any(|a| a["name"].as_str() == Some(scout.as_str())));

    let busy = call(
        &router,
        &ctx,
        "agent_status",
        json!({ "agent": scout.as_str(), "status": "busy" }),
    )
    .await;
    assert_eq!(busy["status"], json!("busy"));

    let joined = call(&router, &ctx, "agent_join", json!({ "agent": scout.as_str() })).await;
    assert_eq!(joined["joined"], json!(true));
    let sessions = call(&router, &ctx, "agent_sessions", json!({})).await;
    assert_eq!(sessions["sessions"].as_array().map(Vec::len), Some(1));

    let sent = call(
        &router,
        &ctx,
        "agent_message",
        json!({ "fromAgent": scout.as_str(), "title": "handoff", "content": "breaker wired" }),
    )
    .await;
    assert!(sent["id"].is_string());
    let messages = call(&router, &ctx, "agent_messages", json!({})).await;
    assert!(messages["total"].as_i64().expect("total") >= 1);

    let left = call(&router, &ctx, "agent_leave", json!({ "agent": scout.as_str() })).await;
    assert_eq!(left["left"], json!(true));
    let after = call(&router, &ctx, "agent_sessions", json!({})).await;
    assert_eq!(after["sessions"].as_array().map(Vec::len), Some(0));
}

// ============================================================================
// SECTION: Search Scenarios
// ============================================================================

#[tokio::test]
async fn smart_search_spans_every_source() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    let name = format!("ss-{}", Uuid::new_v4());
    let created = call(&router, &ctx, "project_create", json!({ "name": name.as_str() })).await;
    let project_id = Uuid::parse_str(created["id"].as_str().expect("project id")).expect("uuid");
    call(&router, &ctx, "project_switch", json!({ "project": name.as_str() })).await;

    call(
        &router,
        &ctx,
        "context_store",
        json!({ "type": "code", "content": "authentication middleware for the http layer" }),
    )
    .await;
    call(
        &router,
        &ctx,
        "decision_record",
        json!({
            "title": "Adopt token authentication",
            "problem": "requests are anonymous",
            "decision": "require bearer tokens for authentication"
        }),
    )
    .await;
    call(
        &router,
        &ctx,
        "naming_register",
        json!({ "entityType": "function", "canonicalName": "validateAuthentication" }),
    )
    .await;
    // The analysis pipelines that populate code components are external;
    // seed one row directly.
    let url = std::env::var("AIDIS_TEST_DATABASE_URL").expect("gated url");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("seed pool");
    sqlx::query(
        "INSERT INTO code_components (id, project_id, name, file_path) \
         VALUES ($1, $2, 'authentication_guard', 'src/auth.rs')",
    )
    .bind(Uuid::new_v4())
    .bind(project_id)
    .execute(&pool)
    .await
    .expect("seed code component");
    pool.close().await;

    let found =
        call(&router, &ctx, "smart_search", json!({ "query": "authentication", "limit": 20 }))
            .await;
    let results = found["results"].as_array().expect("results");
    for source in ["contexts", "decisions", "naming", "code"] {
        assert!(
            results.iter().any(|r| r["source"].as_str() == Some(source)),
            "missing {source} hits in {results:?}"
        );
    }
    let relevances: Vec<f64> =
        results.iter().map(|r| r["relevance"].as_f64().expect("relevance")).collect();
    assert!(
        relevances.windows(2).all(|pair| pair[0] >= pair[1]),
        "results must be ordered by relevance: {relevances:?}"
    );
}

#[tokio::test]
async fn recommendations_flag_blocked_work() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "rec").await;
    let created = call(&router, &ctx, "task_create", json!({ "title": "unblock the pool" })).await;
    let task_id = created["id"].as_str().expect("task id").to_string();
    call(&router, &ctx, "task_update", json!({ "taskId": task_id.as_str(), "status": "blocked" })).await;

    let derived = call(&router, &ctx, "get_recommendations", json!({})).await;
    let recommendations = derived["recommendations"].as_array().expect("recommendations");
    assert!(recommendations.iter().any(|r| {
        r["type"] == json!("tasks")
            && r["message"].as_str().is_some_and(|m| m.contains("blocked"))
    }));

    let focused =
        call(&router, &ctx, "get_recommendations", json!({ "focus": "tasks" })).await;
    let focused = focused["recommendations"].as_array().expect("recommendations");
    assert!(!focused.is_empty());
    assert!(focused.iter().all(|r| r["type"] == json!("tasks")));
}

// ============================================================================
// SECTION: Task Scenarios
// ============================================================================

#[tokio::test]
async fn task_update_with_current_status_is_a_no_op() {
    let Some(router) = test_router().await else {
        return;
    };
    let ctx = context();
    fresh_project(&router, &ctx, "task").await;
    let created = call(&router, &ctx, "task_create", json!({ "title": "wire the breaker" })).await;
    let task_id = created["id"].as_str().expect("task id").to_string();

    let noop =
        call(&router, &ctx, "task_update", json!({ "taskId": task_id.as_str(), "status": "todo" })).await;
    assert_eq!(noop["updated_at"], created["updated_at"], "no-op must not touch timestamps");
    assert!(noop["started_at"].is_null());

    let started = call(
        &router,
        &ctx,
        "task_update",
        json!({ "taskId": task_id.as_str(), "status": "in_progress" }),
    )
    .await;
    assert!(started["started_at"].is_string(), "started_at set on first in_progress");

    let completed = call(
        &router,
        &ctx,
        "task_update",
        json!({ "taskId": task_id.as_str(), "status": "completed" }),
    )
    .await;
    assert!(completed["completed_at"].is_string(), "completed_at set on completion");
    assert_eq!(completed["started_at"], started["started_at"]);
}
