// aidis-contract/src/schemas.rs
// ============================================================================
// Module: Tool Input Schemas
// Description: JSON schema builders for every dispatcher tool.
// Purpose: Provide canonical validation schemas from a single source.
// Dependencies: aidis-core, serde_json
// ============================================================================

//! ## Overview
//! One draft 2020-12 JSON schema per tool, built programmatically. All
//! schemas are closed objects (`additionalProperties: false`) so unknown
//! fields are rejected before dispatch. UUID-valued fields carry an explicit
//! pattern so a malformed identifier is reported against its field name
//! rather than surfacing later as a decode failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aidis_core::ContextType;
use aidis_core::EntityKind;
use aidis_core::ToolName;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical hyphenated UUID pattern.
const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";
/// Maximum context content length in characters.
const MAX_CONTENT_LENGTH: u32 = 100_000;
/// Maximum length for names and titles.
const MAX_NAME_LENGTH: u32 = 255;
/// Maximum page size for list-style tools.
const MAX_LIST_LIMIT: u32 = 100;
/// Maximum page size for smart search.
const MAX_SEARCH_LIMIT: u32 = 50;

// ============================================================================
// SECTION: Public Entrypoint
// ============================================================================

/// Returns the input schema for a tool's `arguments` object.
#[must_use]
pub fn input_schema(tool: ToolName) -> Value {
    match tool {
        ToolName::AidisPing => ping_schema(),
        ToolName::AidisStatus | ToolName::SessionStatus => empty_schema(),
        ToolName::AidisHelp => help_schema(),
        ToolName::ContextStore => context_store_schema(),
        ToolName::ContextSearch => context_search_schema(),
        ToolName::ContextGetRecent => context_get_recent_schema(),
        ToolName::ContextStats
        | ToolName::ProjectInsights
        | ToolName::NamingStats
        | ToolName::DecisionStats
        | ToolName::AgentSessions => project_scoped_schema(),
        ToolName::ProjectCreate => project_create_schema(),
        ToolName::ProjectList => project_list_schema(),
        ToolName::ProjectSwitch => project_switch_schema(),
        ToolName::ProjectCurrent => project_current_schema(),
        ToolName::ProjectInfo => project_info_schema(),
        ToolName::SessionNew => session_new_schema(),
        ToolName::SessionAssign => session_assign_schema(),
        ToolName::SessionUpdate => session_update_schema(),
        ToolName::NamingRegister => naming_register_schema(),
        ToolName::NamingCheck => naming_check_schema(),
        ToolName::NamingSuggest => naming_suggest_schema(),
        ToolName::DecisionRecord => decision_record_schema(),
        ToolName::DecisionSearch => decision_search_schema(),
        ToolName::DecisionUpdate => decision_update_schema(),
        ToolName::TaskCreate => task_create_schema(),
        ToolName::TaskList => task_list_schema(),
        ToolName::TaskUpdate => task_update_schema(),
        ToolName::TaskDetails => task_details_schema(),
        ToolName::AgentRegister => agent_register_schema(),
        ToolName::AgentList => empty_schema(),
        ToolName::AgentStatus => agent_status_schema(),
        ToolName::AgentJoin => agent_join_schema(),
        ToolName::AgentLeave => agent_leave_schema(),
        ToolName::AgentMessage => agent_message_schema(),
        ToolName::AgentMessages => agent_messages_schema(),
        ToolName::SmartSearch => smart_search_schema(),
        ToolName::GetRecommendations => get_recommendations_schema(),
    }
}

// ============================================================================
// SECTION: Shared Builders
// ============================================================================

/// Builds a closed object schema from required fields and properties.
fn object_schema(required: &[&str], properties: Map<String, Value>) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": required,
        "properties": properties,
        "additionalProperties": false
    })
}

/// Schema for a UUID-valued field.
fn uuid_schema(description: &str) -> Value {
    json!({ "type": "string", "pattern": UUID_PATTERN, "description": description })
}

/// Schema for a bounded non-empty string field.
fn string_schema(description: &str, max_length: u32) -> Value {
    json!({ "type": "string", "minLength": 1, "maxLength": max_length, "description": description })
}

/// Schema for an unbounded optional text field.
fn text_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Schema for a tag list.
fn tags_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string", "minLength": 1, "maxLength": MAX_NAME_LENGTH },
        "description": description
    })
}

/// Schema for a free-form metadata bag.
fn metadata_schema() -> Value {
    json!({ "type": "object", "description": "Free-form metadata bag." })
}

/// Schema for a bounded integer page size.
fn limit_schema(max: u32, description: &str) -> Value {
    json!({ "type": "integer", "minimum": 0, "maximum": max, "description": description })
}

/// Schema for a non-negative integer offset.
fn offset_schema() -> Value {
    json!({ "type": "integer", "minimum": 0, "description": "Pagination offset." })
}

/// Schema for a closed string enum.
fn enum_schema(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

/// Schema for an array of UUID references.
fn uuid_list_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string", "pattern": UUID_PATTERN },
        "description": description
    })
}

/// Wire forms for the context type enum.
fn context_type_values() -> Vec<&'static str> {
    [
        ContextType::Code,
        ContextType::Decision,
        ContextType::Error,
        ContextType::Discussion,
        ContextType::Planning,
        ContextType::Completion,
    ]
    .iter()
    .map(|value| value.as_str())
    .collect()
}

/// Wire forms for the naming entity type enum.
fn entity_type_values() -> Vec<&'static str> {
    aidis_core::NamingEntityType::all().iter().map(|value| value.as_str()).collect()
}

/// Wire forms for the task status enum.
const TASK_STATUS_VALUES: &[&str] = &["todo", "in_progress", "blocked", "completed", "cancelled"];
/// Wire forms for the task priority enum.
const TASK_PRIORITY_VALUES: &[&str] = &["low", "medium", "high", "urgent"];
/// Wire forms for the decision status enum.
const DECISION_STATUS_VALUES: &[&str] = &["active", "under_review", "superseded", "deprecated"];
/// Wire forms for the decision impact enum.
const IMPACT_LEVEL_VALUES: &[&str] = &["low", "medium", "high", "critical"];
/// Wire forms for the agent status enum.
const AGENT_STATUS_VALUES: &[&str] = &["active", "busy", "offline", "error"];

/// Properties map builder.
fn properties(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

/// Schema for tools that take no arguments.
fn empty_schema() -> Value {
    object_schema(&[], Map::new())
}

/// Schema for tools scoped only by an optional project.
fn project_scoped_schema() -> Value {
    object_schema(
        &[],
        properties(vec![(
            "projectId",
            uuid_schema("Project scope; defaults to the session's active project."),
        )]),
    )
}

// ============================================================================
// SECTION: System Tools
// ============================================================================

/// `aidis_ping` input schema.
fn ping_schema() -> Value {
    object_schema(
        &[],
        properties(vec![("message", string_schema("Message echoed back.", MAX_NAME_LENGTH))]),
    )
}

/// `aidis_help` input schema.
fn help_schema() -> Value {
    object_schema(
        &[],
        properties(vec![(
            "category",
            enum_schema(
                &[
                    "system", "context", "project", "session", "naming", "decision", "task",
                    "agent", "search",
                ],
                "Restrict the catalog to one category.",
            ),
        )]),
    )
}

// ============================================================================
// SECTION: Context Tools
// ============================================================================

/// `context_store` input schema.
fn context_store_schema() -> Value {
    object_schema(
        &["type", "content"],
        properties(vec![
            ("type", enum_schema(&context_type_values(), "Context classification.")),
            ("content", string_schema("Context body to store.", MAX_CONTENT_LENGTH)),
            ("tags", tags_schema("Tags attached to the context.")),
            (
                "relevanceScore",
                json!({
                    "type": "number",
                    "minimum": 0,
                    "maximum": 10,
                    "description": "Relevance score assigned at store time."
                }),
            ),
            ("metadata", metadata_schema()),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("sessionId", uuid_schema("Session the context belongs to.")),
        ]),
    )
}

/// `context_search` input schema.
fn context_search_schema() -> Value {
    object_schema(
        &["query"],
        properties(vec![
            ("query", string_schema("Search text.", MAX_CONTENT_LENGTH)),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("type", enum_schema(&context_type_values(), "Restrict to one context type.")),
            ("tags", tags_schema("Require set-overlap with these tags.")),
            ("limit", limit_schema(MAX_LIST_LIMIT, "Maximum results.")),
            (
                "minSimilarity",
                json!({
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "Minimum similarity in [0, 1]."
                }),
            ),
            ("offset", offset_schema()),
        ]),
    )
}

/// `context_get_recent` input schema.
fn context_get_recent_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("limit", limit_schema(MAX_LIST_LIMIT, "Maximum results.")),
        ]),
    )
}

// ============================================================================
// SECTION: Project Tools
// ============================================================================

/// `project_create` input schema.
fn project_create_schema() -> Value {
    object_schema(
        &["name"],
        properties(vec![
            ("name", string_schema("Unique project name.", MAX_NAME_LENGTH)),
            ("description", text_schema("Optional project description.")),
            ("metadata", metadata_schema()),
        ]),
    )
}

/// `project_list` input schema.
fn project_list_schema() -> Value {
    object_schema(
        &[],
        properties(vec![(
            "includeArchived",
            json!({ "type": "boolean", "description": "Include archived projects." }),
        )]),
    )
}

/// `project_switch` input schema.
fn project_switch_schema() -> Value {
    object_schema(
        &["project"],
        properties(vec![
            ("project", string_schema("Project id or name.", MAX_NAME_LENGTH)),
            ("sessionId", uuid_schema("Session whose active project changes.")),
        ]),
    )
}

/// `project_current` input schema.
fn project_current_schema() -> Value {
    object_schema(
        &[],
        properties(vec![("sessionId", uuid_schema("Session to resolve; defaults to tracked."))]),
    )
}

/// `project_info` input schema.
fn project_info_schema() -> Value {
    object_schema(
        &["project"],
        properties(vec![("project", string_schema("Project id or name.", MAX_NAME_LENGTH))]),
    )
}

// ============================================================================
// SECTION: Session Tools
// ============================================================================

/// `session_new` input schema.
fn session_new_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("projectId", uuid_schema("Project the new session belongs to.")),
            ("title", string_schema("Optional session title.", MAX_NAME_LENGTH)),
        ]),
    )
}

/// `session_assign` input schema.
fn session_assign_schema() -> Value {
    object_schema(
        &["project"],
        properties(vec![("project", string_schema("Project id or name.", MAX_NAME_LENGTH))]),
    )
}

/// `session_update` input schema.
fn session_update_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("sessionId", uuid_schema("Session to update; defaults to tracked.")),
            (
                "productivityScore",
                json!({
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Productivity score."
                }),
            ),
            ("ended", json!({ "type": "boolean", "description": "Close the session." })),
        ]),
    )
}

// ============================================================================
// SECTION: Naming Tools
// ============================================================================

/// `naming_register` input schema.
fn naming_register_schema() -> Value {
    object_schema(
        &["entityType", "canonicalName"],
        properties(vec![
            ("entityType", enum_schema(&entity_type_values(), "Registered entity type.")),
            ("canonicalName", string_schema("Canonical name to register.", MAX_NAME_LENGTH)),
            ("aliases", tags_schema("Accepted aliases.")),
            ("description", text_schema("What the name refers to.")),
            ("convention", string_schema("Convention descriptor.", MAX_NAME_LENGTH)),
            ("contextTags", tags_schema("Context tags for this entry.")),
            ("relatedEntities", uuid_list_schema("Related registry entry ids.")),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

/// `naming_check` input schema.
fn naming_check_schema() -> Value {
    object_schema(
        &["entityType", "proposedName"],
        properties(vec![
            ("entityType", enum_schema(&entity_type_values(), "Entity type to check against.")),
            ("proposedName", string_schema("Name to check.", MAX_NAME_LENGTH)),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

/// `naming_suggest` input schema.
fn naming_suggest_schema() -> Value {
    object_schema(
        &["entityType", "description"],
        properties(vec![
            ("entityType", enum_schema(&entity_type_values(), "Entity type to suggest for.")),
            ("description", string_schema("Free-text description.", MAX_CONTENT_LENGTH)),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

// ============================================================================
// SECTION: Decision Tools
// ============================================================================

/// `decision_record` input schema.
fn decision_record_schema() -> Value {
    let alternative = json!({
        "type": "object",
        "required": ["name", "description"],
        "properties": {
            "name": { "type": "string", "minLength": 1, "maxLength": MAX_NAME_LENGTH },
            "description": { "type": "string" },
            "pros": { "type": "array", "items": { "type": "string" } },
            "cons": { "type": "array", "items": { "type": "string" } }
        },
        "additionalProperties": false
    });
    object_schema(
        &["title", "problem", "decision"],
        properties(vec![
            ("title", string_schema("Short decision title.", MAX_NAME_LENGTH)),
            ("problem", text_schema("Problem statement.")),
            ("decision", text_schema("Decision taken.")),
            ("rationale", text_schema("Why this decision was taken.")),
            (
                "alternatives",
                json!({
                    "type": "array",
                    "items": alternative,
                    "description": "Alternatives considered, in order."
                }),
            ),
            ("impactLevel", enum_schema(IMPACT_LEVEL_VALUES, "Impact level.")),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

/// `decision_search` input schema.
fn decision_search_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("query", string_schema("Keyword query.", MAX_CONTENT_LENGTH)),
            ("status", enum_schema(DECISION_STATUS_VALUES, "Restrict to one status.")),
            ("impactLevel", enum_schema(IMPACT_LEVEL_VALUES, "Restrict to one impact level.")),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("limit", limit_schema(MAX_LIST_LIMIT, "Maximum results.")),
            ("offset", offset_schema()),
        ]),
    )
}

/// `decision_update` input schema.
fn decision_update_schema() -> Value {
    object_schema(
        &["decisionId"],
        properties(vec![
            ("decisionId", uuid_schema("Decision to update.")),
            ("status", enum_schema(DECISION_STATUS_VALUES, "New status.")),
            ("rationale", text_schema("Updated rationale.")),
        ]),
    )
}

// ============================================================================
// SECTION: Task Tools
// ============================================================================

/// `task_create` input schema.
fn task_create_schema() -> Value {
    object_schema(
        &["title"],
        properties(vec![
            ("title", string_schema("Task title.", MAX_NAME_LENGTH)),
            ("description", text_schema("Longer task description.")),
            ("type", string_schema("Free-form task type label.", MAX_NAME_LENGTH)),
            ("priority", enum_schema(TASK_PRIORITY_VALUES, "Task priority.")),
            ("assignee", string_schema("Assigned agent or user.", MAX_NAME_LENGTH)),
            ("dependencies", uuid_list_schema("Tasks this task depends on.")),
            ("tags", tags_schema("Tags attached to the task.")),
            ("metadata", metadata_schema()),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

/// `task_list` input schema.
fn task_list_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("status", enum_schema(TASK_STATUS_VALUES, "Restrict to one status.")),
            ("assignee", string_schema("Restrict to one assignee.", MAX_NAME_LENGTH)),
            ("type", string_schema("Restrict to one task type.", MAX_NAME_LENGTH)),
            ("limit", limit_schema(MAX_LIST_LIMIT, "Maximum results.")),
            ("offset", offset_schema()),
        ]),
    )
}

/// `task_update` input schema.
fn task_update_schema() -> Value {
    object_schema(
        &["taskId"],
        properties(vec![
            ("taskId", uuid_schema("Task to update.")),
            ("status", enum_schema(TASK_STATUS_VALUES, "New status.")),
            ("priority", enum_schema(TASK_PRIORITY_VALUES, "New priority.")),
            ("assignee", string_schema("New assignee.", MAX_NAME_LENGTH)),
            ("metadata", metadata_schema()),
        ]),
    )
}

/// `task_details` input schema.
fn task_details_schema() -> Value {
    object_schema(&["taskId"], properties(vec![("taskId", uuid_schema("Task to fetch."))]))
}

// ============================================================================
// SECTION: Agent Tools
// ============================================================================

/// `agent_register` input schema.
fn agent_register_schema() -> Value {
    object_schema(
        &["name"],
        properties(vec![
            ("name", string_schema("Agent name.", MAX_NAME_LENGTH)),
            ("type", string_schema("Free-form agent type label.", MAX_NAME_LENGTH)),
            ("capabilities", tags_schema("Declared capability set.")),
        ]),
    )
}

/// `agent_status` input schema.
fn agent_status_schema() -> Value {
    object_schema(
        &["agent", "status"],
        properties(vec![
            ("agent", string_schema("Agent id or name.", MAX_NAME_LENGTH)),
            ("status", enum_schema(AGENT_STATUS_VALUES, "New presence status.")),
        ]),
    )
}

/// `agent_join` input schema.
fn agent_join_schema() -> Value {
    object_schema(
        &["agent"],
        properties(vec![
            ("agent", string_schema("Agent id or name.", MAX_NAME_LENGTH)),
            ("projectId", uuid_schema("Project to join; defaults to the active project.")),
            ("sessionId", uuid_schema("Session the agent joins under.")),
        ]),
    )
}

/// `agent_leave` input schema.
fn agent_leave_schema() -> Value {
    object_schema(
        &["agent"],
        properties(vec![
            ("agent", string_schema("Agent id or name.", MAX_NAME_LENGTH)),
            ("projectId", uuid_schema("Project to leave; defaults to the active project.")),
        ]),
    )
}

/// `agent_message` input schema.
fn agent_message_schema() -> Value {
    object_schema(
        &["fromAgent", "title", "content"],
        properties(vec![
            ("fromAgent", string_schema("Sending agent id or name.", MAX_NAME_LENGTH)),
            ("toAgent", string_schema("Receiving agent id or name.", MAX_NAME_LENGTH)),
            ("type", string_schema("Free-form message type label.", MAX_NAME_LENGTH)),
            ("title", string_schema("Message title.", MAX_NAME_LENGTH)),
            ("content", string_schema("Message body.", MAX_CONTENT_LENGTH)),
            ("taskRefs", uuid_list_schema("Referenced tasks.")),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
        ]),
    )
}

/// `agent_messages` input schema.
fn agent_messages_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("agent", string_schema("Restrict to one agent id or name.", MAX_NAME_LENGTH)),
            ("type", string_schema("Restrict to one message type.", MAX_NAME_LENGTH)),
            ("limit", limit_schema(MAX_LIST_LIMIT, "Maximum results.")),
        ]),
    )
}

// ============================================================================
// SECTION: Search Tools
// ============================================================================

/// `smart_search` input schema.
fn smart_search_schema() -> Value {
    object_schema(
        &["query"],
        properties(vec![
            ("query", string_schema("Search text.", MAX_CONTENT_LENGTH)),
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            (
                "include",
                json!({
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": ["contexts", "decisions", "naming", "code"]
                    },
                    "description": "Sources to search; all when omitted."
                }),
            ),
            ("limit", limit_schema(MAX_SEARCH_LIMIT, "Maximum merged results.")),
        ]),
    )
}

/// `get_recommendations` input schema.
fn get_recommendations_schema() -> Value {
    object_schema(
        &[],
        properties(vec![
            ("projectId", uuid_schema("Project scope; defaults to the active project.")),
            ("focus", string_schema("Optional focus area.", MAX_NAME_LENGTH)),
        ]),
    )
}

// ============================================================================
// SECTION: Entity Registry
// ============================================================================

/// Returns the SSE entity kinds clients may subscribe to.
#[must_use]
pub fn subscribable_entities() -> Vec<&'static str> {
    EntityKind::all().iter().map(|kind| kind.as_str()).collect()
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
    use jsonschema::Draft;
    use serde_json::json;

    use super::input_schema;
    use super::subscribable_entities;

    #[test]
    fn every_tool_schema_compiles() {
        for tool in ToolName::all() {
            let schema = input_schema(*tool);
            let compiled = jsonschema::options().with_draft(Draft::Draft202012).build(&schema);
            assert!(compiled.is_ok(), "schema for {tool} failed to compile");
        }
    }

    #[test]
    fn every_tool_schema_is_a_closed_object() {
        for tool in ToolName::all() {
            let schema = input_schema(*tool);
            assert_eq!(schema["type"], json!("object"), "{tool} schema is not an object");
            assert_eq!(
                schema["additionalProperties"],
                json!(false),
                "{tool} schema is not closed"
            );
        }
    }

    #[test]
    fn context_store_requires_type_and_content() {
        let schema = input_schema(ToolName::ContextStore);
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .expect("compile");
        assert!(compiled.validate(&json!({"type": "code", "content": "x"})).is_ok());
        assert!(compiled.validate(&json!({"content": "x"})).is_err());
        assert!(compiled.validate(&json!({"type": "poetry", "content": "x"})).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let schema = input_schema(ToolName::ProjectSwitch);
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .expect("compile");
        assert!(compiled.validate(&json!({"project": "alpha", "bogus": 1})).is_err());
    }

    #[test]
    fn search_limit_is_bounded() {
        let schema = input_schema(ToolName::ContextSearch);
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .expect("compile");
        assert!(compiled.validate(&json!({"query": "x", "limit": 0})).is_ok());
        assert!(compiled.validate(&json!({"query": "x", "limit": 100})).is_ok());
        assert!(compiled.validate(&json!({"query": "x", "limit": 101})).is_err());
    }

    #[test]
    fn malformed_uuid_fields_fail_validation() {
        let schema = input_schema(ToolName::TaskDetails);
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .expect("compile");
        assert!(compiled.validate(&json!({"taskId": "not-a-uuid"})).is_err());
        assert!(
            compiled
                .validate(&json!({"taskId": "7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1"}))
                .is_ok()
        );
    }

    #[test]
    fn subscribable_entities_cover_the_registry() {
        let entities = subscribable_entities();
        assert!(entities.contains(&"tasks"));
        assert!(entities.contains(&"contexts"));
        assert_eq!(entities.len(), 9);
    }
}
