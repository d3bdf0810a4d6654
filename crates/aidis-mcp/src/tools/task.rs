// aidis-mcp/src/tools/task.rs
// ============================================================================
// Module: Task Tools
// Description: Task lifecycle: create, list, update, details.
// Purpose: Coordinate work items across agents.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

//! ## Overview
//! `task_update` carries the lifecycle timestamps in one statement:
//! `started_at` is set on the first transition into `in_progress`,
//! `completed_at` on each transition into `completed`, and an update that
//! repeats the current status without other changes leaves every
//! timestamp untouched.

use aidis_core::ProjectId;
use aidis_core::TaskId;
use aidis_core::TaskPriority;
use aidis_core::TaskStatus;
use aidis_core::ToolError;
use aidis_db::SqlParam;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;
use crate::tools::rows;

/// Column list shared by task selects.
const TASK_COLUMNS: &str = "id, project_id, title, description, task_type, status, priority, \
     assignee, dependencies, tags, metadata, created_at, updated_at, started_at, completed_at";
/// Default page size for task listing.
const DEFAULT_LIMIT: i64 = 50;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `task_create` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Task title.
    pub title: String,
    /// Longer task description.
    pub description: Option<String>,
    /// Free-form task type label.
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    /// Task priority.
    pub priority: Option<TaskPriority>,
    /// Assigned agent or user.
    pub assignee: Option<String>,
    /// Tasks this task depends on.
    pub dependencies: Option<Vec<TaskId>>,
    /// Tags attached to the task.
    pub tags: Option<Vec<String>>,
    /// Free-form metadata bag.
    pub metadata: Option<Value>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `task_list` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Restrict to one status.
    pub status: Option<TaskStatus>,
    /// Restrict to one assignee.
    pub assignee: Option<String>,
    /// Restrict to one task type.
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// `task_update` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Task to update.
    pub task_id: TaskId,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<TaskPriority>,
    /// New assignee.
    pub assignee: Option<String>,
    /// Metadata replacement.
    pub metadata: Option<Value>,
}

/// `task_details` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRequest {
    /// Task to fetch.
    pub task_id: TaskId,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Creates a task.
pub(crate) async fn create(
    router: &ToolRouter,
    context: &DispatchContext,
    request: CreateRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let sql = format!(
        "INSERT INTO tasks \
         (id, project_id, title, description, task_type, status, priority, assignee, \
          dependencies, tags, metadata, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, 'todo', $6, $7, $8, $9, $10, now(), now()) \
         RETURNING {TASK_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::Text(request.title),
        SqlParam::OptText(request.description),
        SqlParam::Text(request.task_type.unwrap_or_else(|| "general".to_string())),
        SqlParam::Text(request.priority.unwrap_or(TaskPriority::Medium).as_str().to_string()),
        SqlParam::OptText(request.assignee),
        SqlParam::UuidArray(
            request.dependencies.unwrap_or_default().iter().map(|id| id.as_uuid()).collect(),
        ),
        SqlParam::TextArray(request.tags.unwrap_or_default()),
        SqlParam::Json(request.metadata.unwrap_or_else(|| json!({}))),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::task(&row)?).unwrap_or_default()))
}

/// Lists tasks with filters.
pub(crate) async fn list(
    router: &ToolRouter,
    context: &DispatchContext,
    request: ListRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE project_id = $1 \
           AND ($2::text IS NULL OR status = $2) \
           AND ($3::text IS NULL OR assignee = $3) \
           AND ($4::text IS NULL OR task_type = $4) \
         ORDER BY created_at DESC LIMIT $5 OFFSET $6"
    );
    let params = [
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::OptText(request.status.map(|s| s.as_str().to_string())),
        SqlParam::OptText(request.assignee),
        SqlParam::OptText(request.task_type),
        SqlParam::Int(request.limit.unwrap_or(DEFAULT_LIMIT)),
        SqlParam::Int(request.offset.unwrap_or(0)),
    ];
    let result_rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    let tasks = result_rows
        .iter()
        .map(|row| rows::task(row).map(|t| serde_json::to_value(t).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    let total = tasks.len();
    Ok(ToolOutput::new(json!({ "tasks": tasks, "total": total })))
}

/// Updates a task; lifecycle timestamps ride along in the same statement.
pub(crate) async fn update(
    router: &ToolRouter,
    context: &DispatchContext,
    request: UpdateRequest,
) -> Result<ToolOutput, ToolError> {
    let sql = format!(
        "UPDATE tasks SET \
         status = COALESCE($2, status), \
         priority = COALESCE($3, priority), \
         assignee = COALESCE($4, assignee), \
         metadata = COALESCE($5, metadata), \
         started_at = CASE \
             WHEN $2 = 'in_progress' AND status <> 'in_progress' AND started_at IS NULL \
             THEN now() ELSE started_at END, \
         completed_at = CASE \
             WHEN $2 = 'completed' AND status <> 'completed' \
             THEN now() ELSE completed_at END, \
         updated_at = CASE \
             WHEN ($2 IS NULL OR $2 = status) AND $3 IS NULL AND $4 IS NULL AND $5 IS NULL \
             THEN updated_at ELSE now() END \
         WHERE id = $1 RETURNING {TASK_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(request.task_id.as_uuid()),
        SqlParam::OptText(request.status.map(|s| s.as_str().to_string())),
        SqlParam::OptText(request.priority.map(|p| p.as_str().to_string())),
        SqlParam::OptText(request.assignee),
        SqlParam::OptJson(request.metadata),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::TaskNotFound(request.task_id.to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::task(&row)?).unwrap_or_default()))
}

/// Fetches full task details.
pub(crate) async fn details(
    router: &ToolRouter,
    context: &DispatchContext,
    request: DetailsRequest,
) -> Result<ToolOutput, ToolError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &[SqlParam::Uuid(request.task_id.as_uuid())])
        .await?
        .ok_or_else(|| ToolError::TaskNotFound(request.task_id.to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::task(&row)?).unwrap_or_default()))
}
