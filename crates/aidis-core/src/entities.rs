// aidis-core/src/entities.rs
// ============================================================================
// Module: AIDIS Entities
// Description: Domain rows mirrored from the authoritative database.
// Purpose: Provide typed shapes for contexts, projects, decisions, tasks,
//          agents, and naming registry entries.
// Dependencies: serde, serde_json, chrono, uuid
// ============================================================================

//! ## Overview
//! These types mirror the database rows the tool handlers read and write.
//! The database is authoritative; nothing here is cached between requests.
//! Closed enums carry stable snake_case wire forms with `as_str`/`parse`
//! helpers so SQL round-trips never depend on serde internals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::AgentId;
use crate::identifiers::ContextId;
use crate::identifiers::DecisionId;
use crate::identifiers::MessageId;
use crate::identifiers::NamingId;
use crate::identifiers::ProjectId;
use crate::identifiers::SessionId;
use crate::identifiers::TaskId;

// ============================================================================
// SECTION: Projects and Sessions
// ============================================================================

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project is in active use.
    Active,
    /// Project exists but sees no current activity.
    Inactive,
    /// Project is archived and read-only by convention.
    Archived,
}

impl ProjectStatus {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Unique project name.
    pub name: String,
    /// Optional human description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Free-form metadata bag.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Owning project, when assigned.
    pub project_id: Option<ProjectId>,
    /// Session start timestamp.
    pub started_at: DateTime<Utc>,
    /// Session end timestamp, when closed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Optional productivity score.
    pub productivity_score: Option<f64>,
}

// ============================================================================
// SECTION: Contexts
// ============================================================================

/// Context entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    /// Source-code related context.
    Code,
    /// Decision discussion context.
    Decision,
    /// Error report or diagnosis.
    Error,
    /// Free-form discussion.
    Discussion,
    /// Planning notes.
    Planning,
    /// Completion summary.
    Completion,
}

impl ContextType {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Decision => "decision",
            Self::Error => "error",
            Self::Discussion => "discussion",
            Self::Planning => "planning",
            Self::Completion => "completion",
        }
    }

    /// Parses a context type from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "decision" => Some(Self::Decision),
            "error" => Some(Self::Error),
            "discussion" => Some(Self::Discussion),
            "planning" => Some(Self::Planning),
            "completion" => Some(Self::Completion),
            _ => None,
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored development context row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Context identifier.
    pub id: ContextId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Session the context was stored under, when known.
    pub session_id: Option<SessionId>,
    /// Context classification.
    pub context_type: ContextType,
    /// Context body.
    pub content: String,
    /// Tag set.
    pub tags: Vec<String>,
    /// Relevance score assigned at store time.
    pub relevance_score: f64,
    /// Free-form metadata bag.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Technical decision lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Decision is in force.
    Active,
    /// Decision is being reconsidered.
    UnderReview,
    /// Decision was replaced by a newer one.
    Superseded,
    /// Decision no longer applies.
    Deprecated,
}

impl DecisionStatus {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::UnderReview => "under_review",
            Self::Superseded => "superseded",
            Self::Deprecated => "deprecated",
        }
    }

    /// Parses a status from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "under_review" => Some(Self::UnderReview),
            "superseded" => Some(Self::Superseded),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact level for a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    /// Localized impact.
    Low,
    /// Module- or feature-level impact.
    Medium,
    /// System-wide impact.
    High,
    /// Architecture-defining impact.
    Critical,
}

impl ImpactLevel {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses an impact level from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Considered alternative recorded alongside a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAlternative {
    /// Alternative name.
    pub name: String,
    /// Alternative description.
    pub description: String,
    /// Arguments in favor.
    #[serde(default)]
    pub pros: Vec<String>,
    /// Arguments against.
    #[serde(default)]
    pub cons: Vec<String>,
}

/// Technical decision row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Decision identifier.
    pub id: DecisionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Short decision title.
    pub title: String,
    /// Problem statement.
    pub problem: String,
    /// Decision taken.
    pub decision: String,
    /// Rationale for the decision.
    pub rationale: String,
    /// Alternatives considered, in recorded order.
    pub alternatives: Vec<DecisionAlternative>,
    /// Lifecycle status.
    pub status: DecisionStatus,
    /// Impact level.
    pub impact_level: ImpactLevel,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// SECTION: Tasks
// ============================================================================

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Work in progress.
    InProgress,
    /// Blocked on a dependency.
    Blocked,
    /// Finished successfully.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Default priority.
    Medium,
    /// High priority.
    High,
    /// Drop-everything priority.
    Urgent,
}

impl TaskPriority {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Parses a priority from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Task title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Free-form task type label.
    pub task_type: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Assigned agent or user, when any.
    pub assignee: Option<String>,
    /// Tasks this task depends on, in recorded order.
    pub dependencies: Vec<TaskId>,
    /// Tag set.
    pub tags: Vec<String>,
    /// Free-form metadata bag.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Set on first entry to `in_progress`.
    pub started_at: Option<DateTime<Utc>>,
    /// Set on entry to `completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// SECTION: Agents
// ============================================================================

/// Agent presence status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Available for coordination.
    Active,
    /// Working on a task.
    Busy,
    /// Not connected.
    Offline,
    /// Faulted.
    Error,
}

impl AgentStatus {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Busy => "busy",
            Self::Offline => "offline",
            Self::Error => "error",
        }
    }

    /// Parses a status from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "busy" => Some(Self::Busy),
            "offline" => Some(Self::Offline),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered agent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Agent identifier.
    pub id: AgentId,
    /// Agent name, unique per project.
    pub name: String,
    /// Free-form agent type label.
    pub agent_type: String,
    /// Declared capability set.
    pub capabilities: Vec<String>,
    /// Presence status.
    pub status: AgentStatus,
    /// Last-seen timestamp.
    pub last_seen: DateTime<Utc>,
}

/// Message exchanged between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Sending agent.
    pub from_agent: AgentId,
    /// Receiving agent; broadcast when absent.
    pub to_agent: Option<AgentId>,
    /// Free-form message type label.
    pub message_type: String,
    /// Message title.
    pub title: String,
    /// Message body.
    pub content: String,
    /// Referenced tasks, when any.
    pub task_refs: Vec<TaskId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// SECTION: Naming Registry
// ============================================================================

/// Entity kinds tracked by the naming registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingEntityType {
    /// Local or member variable.
    Variable,
    /// Function or method.
    Function,
    /// Class.
    Class,
    /// Interface or trait.
    Interface,
    /// UI component.
    Component,
    /// Module or package.
    Module,
    /// Source file.
    File,
    /// Directory.
    Directory,
    /// Configuration key.
    ConfigKey,
    /// Environment variable.
    EnvironmentVar,
    /// Database table.
    DatabaseTable,
    /// Database column.
    DatabaseColumn,
    /// HTTP API endpoint.
    ApiEndpoint,
    /// CSS class.
    CssClass,
    /// Emitted event.
    Event,
    /// Constant.
    Constant,
    /// Named type alias.
    TypeAlias,
}

impl NamingEntityType {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Component => "component",
            Self::Module => "module",
            Self::File => "file",
            Self::Directory => "directory",
            Self::ConfigKey => "config_key",
            Self::EnvironmentVar => "environment_var",
            Self::DatabaseTable => "database_table",
            Self::DatabaseColumn => "database_column",
            Self::ApiEndpoint => "api_endpoint",
            Self::CssClass => "css_class",
            Self::Event => "event",
            Self::Constant => "constant",
            Self::TypeAlias => "type_alias",
        }
    }

    /// Parses an entity type from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "variable" => Some(Self::Variable),
            "function" => Some(Self::Function),
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "component" => Some(Self::Component),
            "module" => Some(Self::Module),
            "file" => Some(Self::File),
            "directory" => Some(Self::Directory),
            "config_key" => Some(Self::ConfigKey),
            "environment_var" => Some(Self::EnvironmentVar),
            "database_table" => Some(Self::DatabaseTable),
            "database_column" => Some(Self::DatabaseColumn),
            "api_endpoint" => Some(Self::ApiEndpoint),
            "css_class" => Some(Self::CssClass),
            "event" => Some(Self::Event),
            "constant" => Some(Self::Constant),
            "type_alias" => Some(Self::TypeAlias),
            _ => None,
        }
    }

    /// Returns all entity types in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Variable,
            Self::Function,
            Self::Class,
            Self::Interface,
            Self::Component,
            Self::Module,
            Self::File,
            Self::Directory,
            Self::ConfigKey,
            Self::EnvironmentVar,
            Self::DatabaseTable,
            Self::DatabaseColumn,
            Self::ApiEndpoint,
            Self::CssClass,
            Self::Event,
            Self::Constant,
            Self::TypeAlias,
        ]
    }
}

impl fmt::Display for NamingEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming registry row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingEntry {
    /// Entry identifier.
    pub id: NamingId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Registered entity type.
    pub entity_type: NamingEntityType,
    /// Canonical registered name.
    pub canonical_name: String,
    /// Accepted aliases.
    pub aliases: Vec<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Convention descriptor recorded at registration.
    pub convention: Option<String>,
    /// Observed usage count.
    pub usage_count: i64,
    /// Whether the name is deprecated.
    pub deprecated: bool,
    /// Reason for deprecation, when deprecated.
    pub deprecated_reason: Option<String>,
    /// Related registry entries.
    pub related_entity_ids: Vec<NamingId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
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

    use super::ContextType;
    use super::NamingEntityType;
    use super::TaskStatus;

    #[test]
    fn enum_wire_forms_round_trip() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Blocked,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        for kind in NamingEntityType::all() {
            assert_eq!(NamingEntityType::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn context_type_rejects_unknown_labels() {
        assert!(ContextType::parse("poetry").is_none());
    }

    #[test]
    fn serde_uses_snake_case_wire_forms() {
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn entity_type_catalog_is_closed() {
        assert_eq!(NamingEntityType::all().len(), 17);
    }
}
