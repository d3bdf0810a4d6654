// aidis-contract/src/tooling.rs
// ============================================================================
// Module: Tool Descriptors
// Description: Catalog descriptors for every dispatcher tool.
// Purpose: Single source for tool listing endpoints and client discovery.
// Dependencies: aidis-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolDefinition`] bundles the facts a client needs to call a tool:
//! its name, description, category, endpoint path, and input schema. The
//! `/mcp/tools` and `/mcp/tools/schemas` endpoints serialize these
//! descriptors verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aidis_core::ToolCategory;
use aidis_core::ToolName;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::schemas::input_schema;

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Tool descriptor served by the listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Canonical tool name.
    pub name: ToolName,
    /// One-line tool description.
    pub description: String,
    /// Catalog category.
    pub category: ToolCategory,
    /// Invocation endpoint path.
    pub endpoint: String,
    /// JSON schema for the tool's `arguments` object.
    pub input_schema: Value,
}

/// Returns the invocation endpoint path for a tool.
#[must_use]
pub fn endpoint_path(tool: ToolName) -> String {
    format!("/mcp/tools/{}", tool.as_str())
}

/// Returns the one-line description for a tool.
#[must_use]
pub const fn tool_description(tool: ToolName) -> &'static str {
    match tool {
        ToolName::AidisPing => "Check server connectivity and measure latency.",
        ToolName::AidisStatus => "Report server health, database, and breaker state.",
        ToolName::AidisHelp => "List available tools grouped by category.",
        ToolName::ContextStore => "Store a development context with its embedding.",
        ToolName::ContextSearch => "Search stored contexts by vector similarity.",
        ToolName::ContextGetRecent => "Fetch the most recent contexts for a project.",
        ToolName::ContextStats => "Count stored contexts grouped by type.",
        ToolName::ProjectCreate => "Create a project.",
        ToolName::ProjectList => "List projects with entity counts.",
        ToolName::ProjectSwitch => "Switch the session's active project.",
        ToolName::ProjectCurrent => "Resolve the session's active project.",
        ToolName::ProjectInfo => "Fetch project details by id or name.",
        ToolName::ProjectInsights => "Derive cross-entity analytics for a project.",
        ToolName::SessionNew => "Start a new tracked session.",
        ToolName::SessionStatus => "Report the tracked session's status.",
        ToolName::SessionAssign => "Assign the tracked session to a project.",
        ToolName::SessionUpdate => "Update tracked session attributes.",
        ToolName::NamingRegister => "Register a name in the project naming registry.",
        ToolName::NamingCheck => "Check a proposed name for registry conflicts.",
        ToolName::NamingSuggest => "Suggest convention-following names from a description.",
        ToolName::NamingStats => "Summarize the naming registry for a project.",
        ToolName::DecisionRecord => "Record a technical decision with alternatives.",
        ToolName::DecisionSearch => "Search recorded decisions by keyword and filters.",
        ToolName::DecisionUpdate => "Update a recorded decision's status or rationale.",
        ToolName::DecisionStats => "Summarize recorded decisions for a project.",
        ToolName::TaskCreate => "Create a task.",
        ToolName::TaskList => "List tasks with filters.",
        ToolName::TaskUpdate => "Update a task's status, priority, or assignee.",
        ToolName::TaskDetails => "Fetch full task details by id.",
        ToolName::AgentRegister => "Register an agent for coordination.",
        ToolName::AgentList => "List registered agents.",
        ToolName::AgentStatus => "Update an agent's presence status.",
        ToolName::AgentJoin => "Join an agent to a project session.",
        ToolName::AgentLeave => "Remove an agent from a project session.",
        ToolName::AgentSessions => "List active agent sessions for a project.",
        ToolName::AgentMessage => "Send a message between agents.",
        ToolName::AgentMessages => "Fetch agent messages with filters.",
        ToolName::SmartSearch => "Search contexts, decisions, naming, and code together.",
        ToolName::GetRecommendations => "Derive read-only recommendations from stored data.",
    }
}

/// Builds the descriptor for one tool.
#[must_use]
pub fn tool_definition(tool: ToolName) -> ToolDefinition {
    ToolDefinition {
        name: tool,
        description: tool_description(tool).to_string(),
        category: tool.category(),
        endpoint: endpoint_path(tool),
        input_schema: input_schema(tool),
    }
}

/// Builds descriptors for every registered tool, in canonical order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::all().iter().map(|tool| tool_definition(*tool)).collect()
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

    use aidis_core::ToolName;

    use super::endpoint_path;
    use super::tool_definitions;

    #[test]
    fn catalog_covers_every_tool() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), ToolName::all().len());
        for definition in &definitions {
            assert!(!definition.description.is_empty());
            assert!(definition.endpoint.starts_with("/mcp/tools/"));
            assert!(definition.input_schema.is_object());
        }
    }

    #[test]
    fn endpoint_paths_use_the_wire_name() {
        assert_eq!(endpoint_path(ToolName::ContextStore), "/mcp/tools/context_store");
    }

    #[test]
    fn descriptors_serialize_with_camel_case_keys() {
        let definition = super::tool_definition(ToolName::AidisPing);
        let value = serde_json::to_value(&definition).expect("serialize");
        assert!(value.get("inputSchema").is_some());
        assert_eq!(value["name"], serde_json::json!("aidis_ping"));
    }
}
