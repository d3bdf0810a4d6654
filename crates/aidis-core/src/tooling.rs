// aidis-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical tool identifiers for the AIDIS dispatcher.
// Purpose: Shared tool naming across contracts, dispatch, and config.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Canonical tool identifiers exposed by the AIDIS HTTP surface. These names
//! are part of the external contract: clients invoke `POST
//! /mcp/tools/{name}` with one of them, and the disabled-tools configuration
//! references them verbatim.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Tool category used for catalog grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Server health and discovery.
    System,
    /// Context storage and retrieval.
    Context,
    /// Project management.
    Project,
    /// Session lifecycle.
    Session,
    /// Naming registry.
    Naming,
    /// Technical decisions.
    Decision,
    /// Task coordination.
    Task,
    /// Agent presence and messaging.
    Agent,
    /// Cross-entity search and analytics.
    Search,
}

impl ToolCategory {
    /// Returns the stable label for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Context => "context",
            Self::Project => "project",
            Self::Session => "session",
            Self::Naming => "naming",
            Self::Decision => "decision",
            Self::Task => "task",
            Self::Agent => "agent",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Canonical tool names for the AIDIS dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Connectivity probe.
    AidisPing,
    /// Server status summary.
    AidisStatus,
    /// Tool catalog grouped by category.
    AidisHelp,
    /// Store a development context with its embedding.
    ContextStore,
    /// Vector-similarity context search.
    ContextSearch,
    /// Most recent contexts for a project.
    ContextGetRecent,
    /// Context counts grouped by type.
    ContextStats,
    /// Create a project.
    ProjectCreate,
    /// List projects.
    ProjectList,
    /// Switch the session's active project.
    ProjectSwitch,
    /// Current active project for the session.
    ProjectCurrent,
    /// Project details by id or name.
    ProjectInfo,
    /// Derived cross-entity project analytics.
    ProjectInsights,
    /// Start a new tracked session.
    SessionNew,
    /// Current tracked session status.
    SessionStatus,
    /// Assign the tracked session to a project.
    SessionAssign,
    /// Update tracked session attributes.
    SessionUpdate,
    /// Register a name in the naming registry.
    NamingRegister,
    /// Check a proposed name for conflicts.
    NamingCheck,
    /// Suggest names from a description.
    NamingSuggest,
    /// Naming registry statistics.
    NamingStats,
    /// Record a technical decision.
    DecisionRecord,
    /// Search recorded decisions.
    DecisionSearch,
    /// Update a recorded decision.
    DecisionUpdate,
    /// Decision statistics.
    DecisionStats,
    /// Create a task.
    TaskCreate,
    /// List tasks with filters.
    TaskList,
    /// Update a task.
    TaskUpdate,
    /// Task details by id.
    TaskDetails,
    /// Register an agent.
    AgentRegister,
    /// List registered agents.
    AgentList,
    /// Update an agent's presence status.
    AgentStatus,
    /// Join an agent to a project session.
    AgentJoin,
    /// Remove an agent from a project session.
    AgentLeave,
    /// List active agent sessions.
    AgentSessions,
    /// Send a message between agents.
    AgentMessage,
    /// Fetch agent messages with filters.
    AgentMessages,
    /// Unified search across entity kinds.
    SmartSearch,
    /// Read-only recommendations derived from stored data.
    GetRecommendations,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AidisPing => "aidis_ping",
            Self::AidisStatus => "aidis_status",
            Self::AidisHelp => "aidis_help",
            Self::ContextStore => "context_store",
            Self::ContextSearch => "context_search",
            Self::ContextGetRecent => "context_get_recent",
            Self::ContextStats => "context_stats",
            Self::ProjectCreate => "project_create",
            Self::ProjectList => "project_list",
            Self::ProjectSwitch => "project_switch",
            Self::ProjectCurrent => "project_current",
            Self::ProjectInfo => "project_info",
            Self::ProjectInsights => "project_insights",
            Self::SessionNew => "session_new",
            Self::SessionStatus => "session_status",
            Self::SessionAssign => "session_assign",
            Self::SessionUpdate => "session_update",
            Self::NamingRegister => "naming_register",
            Self::NamingCheck => "naming_check",
            Self::NamingSuggest => "naming_suggest",
            Self::NamingStats => "naming_stats",
            Self::DecisionRecord => "decision_record",
            Self::DecisionSearch => "decision_search",
            Self::DecisionUpdate => "decision_update",
            Self::DecisionStats => "decision_stats",
            Self::TaskCreate => "task_create",
            Self::TaskList => "task_list",
            Self::TaskUpdate => "task_update",
            Self::TaskDetails => "task_details",
            Self::AgentRegister => "agent_register",
            Self::AgentList => "agent_list",
            Self::AgentStatus => "agent_status",
            Self::AgentJoin => "agent_join",
            Self::AgentLeave => "agent_leave",
            Self::AgentSessions => "agent_sessions",
            Self::AgentMessage => "agent_message",
            Self::AgentMessages => "agent_messages",
            Self::SmartSearch => "smart_search",
            Self::GetRecommendations => "get_recommendations",
        }
    }

    /// Returns all AIDIS tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AidisPing,
            Self::AidisStatus,
            Self::AidisHelp,
            Self::ContextStore,
            Self::ContextSearch,
            Self::ContextGetRecent,
            Self::ContextStats,
            Self::ProjectCreate,
            Self::ProjectList,
            Self::ProjectSwitch,
            Self::ProjectCurrent,
            Self::ProjectInfo,
            Self::ProjectInsights,
            Self::SessionNew,
            Self::SessionStatus,
            Self::SessionAssign,
            Self::SessionUpdate,
            Self::NamingRegister,
            Self::NamingCheck,
            Self::NamingSuggest,
            Self::NamingStats,
            Self::DecisionRecord,
            Self::DecisionSearch,
            Self::DecisionUpdate,
            Self::DecisionStats,
            Self::TaskCreate,
            Self::TaskList,
            Self::TaskUpdate,
            Self::TaskDetails,
            Self::AgentRegister,
            Self::AgentList,
            Self::AgentStatus,
            Self::AgentJoin,
            Self::AgentLeave,
            Self::AgentSessions,
            Self::AgentMessage,
            Self::AgentMessages,
            Self::SmartSearch,
            Self::GetRecommendations,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }

    /// Returns the catalog category for the tool.
    #[must_use]
    pub const fn category(self) -> ToolCategory {
        match self {
            Self::AidisPing | Self::AidisStatus | Self::AidisHelp => ToolCategory::System,
            Self::ContextStore
            | Self::ContextSearch
            | Self::ContextGetRecent
            | Self::ContextStats => ToolCategory::Context,
            Self::ProjectCreate
            | Self::ProjectList
            | Self::ProjectSwitch
            | Self::ProjectCurrent
            | Self::ProjectInfo
            | Self::ProjectInsights => ToolCategory::Project,
            Self::SessionNew | Self::SessionStatus | Self::SessionAssign | Self::SessionUpdate => {
                ToolCategory::Session
            }
            Self::NamingRegister
            | Self::NamingCheck
            | Self::NamingSuggest
            | Self::NamingStats => ToolCategory::Naming,
            Self::DecisionRecord
            | Self::DecisionSearch
            | Self::DecisionUpdate
            | Self::DecisionStats => ToolCategory::Decision,
            Self::TaskCreate | Self::TaskList | Self::TaskUpdate | Self::TaskDetails => {
                ToolCategory::Task
            }
            Self::AgentRegister
            | Self::AgentList
            | Self::AgentStatus
            | Self::AgentJoin
            | Self::AgentLeave
            | Self::AgentSessions
            | Self::AgentMessage
            | Self::AgentMessages => ToolCategory::Agent,
            Self::SmartSearch | Self::GetRecommendations => ToolCategory::Search,
        }
    }

    /// Returns the session activity type recorded after a successful call,
    /// for the tools that are activity-bearing.
    #[must_use]
    pub const fn activity_type(self) -> Option<&'static str> {
        match self {
            Self::ContextStore => Some("context_stored"),
            Self::TaskCreate => Some("task_created"),
            Self::DecisionRecord => Some("decision_recorded"),
            Self::NamingRegister => Some("naming_registered"),
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
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

    use super::ToolCategory;
    use super::ToolName;

    #[test]
    fn tool_names_round_trip() {
        for tool in ToolName::all() {
            assert_eq!(ToolName::parse(tool.as_str()), Some(*tool));
        }
        assert!(ToolName::parse("code_analyze").is_none());
    }

    #[test]
    fn catalog_is_complete() {
        assert_eq!(ToolName::all().len(), 39);
    }

    #[test]
    fn activity_bearing_tools_are_exactly_four() {
        let tracked: Vec<_> =
            ToolName::all().iter().filter(|tool| tool.activity_type().is_some()).collect();
        assert_eq!(tracked.len(), 4);
    }

    #[test]
    fn every_category_has_at_least_one_tool() {
        for category in [
            ToolCategory::System,
            ToolCategory::Context,
            ToolCategory::Project,
            ToolCategory::Session,
            ToolCategory::Naming,
            ToolCategory::Decision,
            ToolCategory::Task,
            ToolCategory::Agent,
            ToolCategory::Search,
        ] {
            assert!(ToolName::all().iter().any(|tool| tool.category() == category));
        }
    }
}
