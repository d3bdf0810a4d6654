// aidis-mcp/src/tools/rows.rs
// ============================================================================
// Module: Row Mapping
// Description: PgRow to domain entity conversion for tool handlers.
// Purpose: One place where column names and entity fields meet.
// Dependencies: aidis-core, sqlx, serde_json
// ============================================================================

//! ## Overview
//! Handlers select explicit column lists and convert rows here. A decode
//! failure is an internal error: the schema and these mappers ship
//! together, so a mismatch is a bug, not client input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aidis_core::Agent;
use aidis_core::AgentId;
use aidis_core::AgentMessage;
use aidis_core::AgentStatus;
use aidis_core::ContextEntry;
use aidis_core::ContextId;
use aidis_core::ContextType;
use aidis_core::Decision;
use aidis_core::DecisionAlternative;
use aidis_core::DecisionId;
use aidis_core::DecisionStatus;
use aidis_core::ImpactLevel;
use aidis_core::MessageId;
use aidis_core::NamingEntityType;
use aidis_core::NamingEntry;
use aidis_core::NamingId;
use aidis_core::Project;
use aidis_core::ProjectId;
use aidis_core::ProjectStatus;
use aidis_core::Session;
use aidis_core::SessionId;
use aidis_core::Task;
use aidis_core::TaskId;
use aidis_core::TaskPriority;
use aidis_core::TaskStatus;
use aidis_core::ToolError;
use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

// ============================================================================
// SECTION: Column Helpers
// ============================================================================

/// Wraps a column decode failure.
fn column_err(name: &str, error: &sqlx::Error) -> ToolError {
    ToolError::Internal(format!("column {name}: {error}"))
}

/// Wraps an unparseable enum label from the database.
fn label_err(name: &str, value: &str) -> ToolError {
    ToolError::Internal(format!("column {name} holds unknown label {value}"))
}

/// Reads a required UUID column.
fn uuid_col(row: &PgRow, name: &str) -> Result<Uuid, ToolError> {
    row.try_get::<Uuid, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads an optional UUID column.
fn opt_uuid_col(row: &PgRow, name: &str) -> Result<Option<Uuid>, ToolError> {
    row.try_get::<Option<Uuid>, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads a required text column.
fn text_col(row: &PgRow, name: &str) -> Result<String, ToolError> {
    row.try_get::<String, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads an optional text column.
fn opt_text_col(row: &PgRow, name: &str) -> Result<Option<String>, ToolError> {
    row.try_get::<Option<String>, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads a text-array column.
fn text_array_col(row: &PgRow, name: &str) -> Result<Vec<String>, ToolError> {
    row.try_get::<Vec<String>, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads a UUID-array column.
fn uuid_array_col(row: &PgRow, name: &str) -> Result<Vec<Uuid>, ToolError> {
    row.try_get::<Vec<Uuid>, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads a JSONB column.
fn json_col(row: &PgRow, name: &str) -> Result<Value, ToolError> {
    row.try_get::<Value, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads a required timestamp column.
fn time_col(row: &PgRow, name: &str) -> Result<DateTime<Utc>, ToolError> {
    row.try_get::<DateTime<Utc>, _>(name).map_err(|error| column_err(name, &error))
}

/// Reads an optional timestamp column.
fn opt_time_col(row: &PgRow, name: &str) -> Result<Option<DateTime<Utc>>, ToolError> {
    row.try_get::<Option<DateTime<Utc>>, _>(name).map_err(|error| column_err(name, &error))
}

// ============================================================================
// SECTION: Entity Mappers
// ============================================================================

/// Maps a `projects` row.
pub(crate) fn project(row: &PgRow) -> Result<Project, ToolError> {
    let status = text_col(row, "status")?;
    Ok(Project {
        id: ProjectId::from_uuid(uuid_col(row, "id")?),
        name: text_col(row, "name")?,
        description: opt_text_col(row, "description")?,
        status: ProjectStatus::parse(&status).ok_or_else(|| label_err("status", &status))?,
        metadata: json_col(row, "metadata")?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

/// Maps a `sessions` row.
pub(crate) fn session(row: &PgRow) -> Result<Session, ToolError> {
    Ok(Session {
        id: SessionId::from_uuid(uuid_col(row, "id")?),
        project_id: opt_uuid_col(row, "project_id")?.map(ProjectId::from_uuid),
        started_at: time_col(row, "started_at")?,
        ended_at: opt_time_col(row, "ended_at")?,
        productivity_score: row
            .try_get::<Option<f64>, _>("productivity_score")
            .map_err(|error| column_err("productivity_score", &error))?,
    })
}

/// Maps a `contexts` row (the embedding column is never read back).
pub(crate) fn context_entry(row: &PgRow) -> Result<ContextEntry, ToolError> {
    let context_type = text_col(row, "context_type")?;
    Ok(ContextEntry {
        id: ContextId::from_uuid(uuid_col(row, "id")?),
        project_id: ProjectId::from_uuid(uuid_col(row, "project_id")?),
        session_id: opt_uuid_col(row, "session_id")?.map(SessionId::from_uuid),
        context_type: ContextType::parse(&context_type)
            .ok_or_else(|| label_err("context_type", &context_type))?,
        content: text_col(row, "content")?,
        tags: text_array_col(row, "tags")?,
        relevance_score: row
            .try_get::<f64, _>("relevance_score")
            .map_err(|error| column_err("relevance_score", &error))?,
        metadata: json_col(row, "metadata")?,
        created_at: time_col(row, "created_at")?,
    })
}

/// Maps a `decisions` row.
pub(crate) fn decision(row: &PgRow) -> Result<Decision, ToolError> {
    let status = text_col(row, "status")?;
    let impact = text_col(row, "impact_level")?;
    let alternatives: Vec<DecisionAlternative> =
        serde_json::from_value(json_col(row, "alternatives")?)
            .map_err(|error| ToolError::Internal(format!("column alternatives: {error}")))?;
    Ok(Decision {
        id: DecisionId::from_uuid(uuid_col(row, "id")?),
        project_id: ProjectId::from_uuid(uuid_col(row, "project_id")?),
        title: text_col(row, "title")?,
        problem: text_col(row, "problem")?,
        decision: text_col(row, "decision")?,
        rationale: text_col(row, "rationale")?,
        alternatives,
        status: DecisionStatus::parse(&status).ok_or_else(|| label_err("status", &status))?,
        impact_level: ImpactLevel::parse(&impact)
            .ok_or_else(|| label_err("impact_level", &impact))?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

/// Maps a `tasks` row.
pub(crate) fn task(row: &PgRow) -> Result<Task, ToolError> {
    let status = text_col(row, "status")?;
    let priority = text_col(row, "priority")?;
    Ok(Task {
        id: TaskId::from_uuid(uuid_col(row, "id")?),
        project_id: ProjectId::from_uuid(uuid_col(row, "project_id")?),
        title: text_col(row, "title")?,
        description: opt_text_col(row, "description")?,
        task_type: text_col(row, "task_type")?,
        status: TaskStatus::parse(&status).ok_or_else(|| label_err("status", &status))?,
        priority: TaskPriority::parse(&priority)
            .ok_or_else(|| label_err("priority", &priority))?,
        assignee: opt_text_col(row, "assignee")?,
        dependencies: uuid_array_col(row, "dependencies")?
            .into_iter()
            .map(TaskId::from_uuid)
            .collect(),
        tags: text_array_col(row, "tags")?,
        metadata: json_col(row, "metadata")?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
        started_at: opt_time_col(row, "started_at")?,
        completed_at: opt_time_col(row, "completed_at")?,
    })
}

/// Maps an `agents` row.
pub(crate) fn agent(row: &PgRow) -> Result<Agent, ToolError> {
    let status = text_col(row, "status")?;
    Ok(Agent {
        id: AgentId::from_uuid(uuid_col(row, "id")?),
        name: text_col(row, "name")?,
        agent_type: text_col(row, "agent_type")?,
        capabilities: text_array_col(row, "capabilities")?,
        status: AgentStatus::parse(&status).ok_or_else(|| label_err("status", &status))?,
        last_seen: time_col(row, "last_seen")?,
    })
}

/// Maps an `agent_messages` row.
pub(crate) fn agent_message(row: &PgRow) -> Result<AgentMessage, ToolError> {
    Ok(AgentMessage {
        id: MessageId::from_uuid(uuid_col(row, "id")?),
        from_agent: AgentId::from_uuid(uuid_col(row, "from_agent")?),
        to_agent: opt_uuid_col(row, "to_agent")?.map(AgentId::from_uuid),
        message_type: text_col(row, "message_type")?,
        title: text_col(row, "title")?,
        content: text_col(row, "content")?,
        task_refs: uuid_array_col(row, "task_refs")?.into_iter().map(TaskId::from_uuid).collect(),
        created_at: time_col(row, "created_at")?,
    })
}

/// Maps a `naming_registry` row.
pub(crate) fn naming_entry(row: &PgRow) -> Result<NamingEntry, ToolError> {
    let entity_type = text_col(row, "entity_type")?;
    Ok(NamingEntry {
        id: NamingId::from_uuid(uuid_col(row, "id")?),
        project_id: ProjectId::from_uuid(uuid_col(row, "project_id")?),
        entity_type: NamingEntityType::parse(&entity_type)
            .ok_or_else(|| label_err("entity_type", &entity_type))?,
        canonical_name: text_col(row, "canonical_name")?,
        aliases: text_array_col(row, "aliases")?,
        description: opt_text_col(row, "description")?,
        convention: opt_text_col(row, "convention")?,
        usage_count: row
            .try_get::<i64, _>("usage_count")
            .map_err(|error| column_err("usage_count", &error))?,
        deprecated: row
            .try_get::<bool, _>("deprecated")
            .map_err(|error| column_err("deprecated", &error))?,
        deprecated_reason: opt_text_col(row, "deprecated_reason")?,
        related_entity_ids: uuid_array_col(row, "related_entity_ids")?
            .into_iter()
            .map(NamingId::from_uuid)
            .collect(),
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}
