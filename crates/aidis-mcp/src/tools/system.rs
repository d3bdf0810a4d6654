// aidis-mcp/src/tools/system.rs
// ============================================================================
// Module: System Tools
// Description: Connectivity probe, server status, and tool catalog.
// Purpose: Health and discovery surface for agents.
// Dependencies: aidis-core, aidis-contract, serde, serde_json
// ============================================================================

use aidis_core::ToolCategory;
use aidis_core::ToolError;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `aidis_ping` request.
#[derive(Debug, Clone, Deserialize)]
pub struct PingRequest {
    /// Message echoed back.
    pub message: Option<String>,
}

/// `aidis_help` request.
#[derive(Debug, Clone, Deserialize)]
pub struct HelpRequest {
    /// Restrict the catalog to one category.
    pub category: Option<ToolCategory>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Echoes the message with a server timestamp.
pub(crate) async fn ping(
    _router: &ToolRouter,
    _context: &DispatchContext,
    request: PingRequest,
) -> Result<ToolOutput, ToolError> {
    let message = request.message.unwrap_or_else(|| "pong".to_string());
    Ok(ToolOutput::new(json!({
        "message": message,
        "timestamp": Utc::now(),
    })))
}

/// Reports server health: database probe, breaker state, SSE stats.
pub(crate) async fn status(
    router: &ToolRouter,
    context: &DispatchContext,
) -> Result<ToolOutput, ToolError> {
    let database = match router.gateway().health_probe(&context.correlation_id).await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };
    let breaker = router.gateway().breaker().snapshot();
    let sse = router.sse().get_stats();
    Ok(ToolOutput::new(json!({
        "status": if database == "healthy" { "ok" } else { "degraded" },
        "timestamp": Utc::now(),
        "uptimeSeconds": router.uptime_seconds(),
        "database": {
            "status": database,
            "breaker": breaker.state.as_str(),
            "consecutiveFailures": breaker.consecutive_failures,
        },
        "events": {
            "sseConnections": sse.total_connections,
            "nextEventId": sse.next_event_id,
        },
        "disabledTools": router.disabled_tools().iter().map(|tool| tool.as_str()).collect::<Vec<_>>(),
    })))
}

/// Lists the tool catalog grouped by category.
pub(crate) fn help(request: HelpRequest) -> Result<ToolOutput, ToolError> {
    let tools: Vec<_> = aidis_contract::tool_definitions()
        .into_iter()
        .filter(|definition| {
            request.category.is_none_or(|category| definition.category == category)
        })
        .map(|definition| {
            json!({
                "name": definition.name,
                "category": definition.category,
                "description": definition.description,
                "endpoint": definition.endpoint,
            })
        })
        .collect();
    Ok(ToolOutput::new(json!({ "tools": tools })))
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

    use aidis_core::ToolCategory;
    use aidis_core::ToolName;
    use serde_json::json;

    use super::HelpRequest;
    use super::help;

    #[test]
    fn help_without_a_category_lists_the_full_catalog() {
        let output = help(HelpRequest {
            category: None,
        })
        .expect("help");
        let tools = output.data["tools"].as_array().expect("tools");
        assert_eq!(tools.len(), ToolName::all().len());
        assert!(tools.iter().all(|tool| {
            tool["endpoint"].as_str().is_some_and(|e| e.starts_with("/mcp/tools/"))
        }));
    }

    #[test]
    fn help_filters_to_one_category() {
        let output = help(HelpRequest {
            category: Some(ToolCategory::Task),
        })
        .expect("help");
        let tools = output.data["tools"].as_array().expect("tools");
        let expected =
            ToolName::all().iter().filter(|tool| tool.category() == ToolCategory::Task).count();
        assert_eq!(tools.len(), expected);
        assert!(tools.iter().all(|tool| tool["category"] == json!("task")));
    }

    #[test]
    fn help_requests_decode_from_wire_labels() {
        let request: HelpRequest =
            serde_json::from_value(json!({ "category": "naming" })).expect("decode");
        assert_eq!(request.category, Some(ToolCategory::Naming));
    }
}
