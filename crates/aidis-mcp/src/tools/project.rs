// aidis-mcp/src/tools/project.rs
// ============================================================================
// Module: Project Tools
// Description: Project CRUD, active-project switching, and insights.
// Purpose: Manage the project scope every other entity hangs off.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

use aidis_core::ProjectId;
use aidis_core::SessionId;
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

/// Column list shared by project selects.
const PROJECT_COLUMNS: &str = "id, name, description, status, metadata, created_at, updated_at";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `project_create` request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    /// Unique project name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Free-form metadata bag.
    pub metadata: Option<Value>,
}

/// `project_list` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Include archived projects.
    pub include_archived: Option<bool>,
}

/// `project_switch` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRequest {
    /// Project id or name.
    pub project: String,
    /// Session whose active project changes.
    pub session_id: Option<SessionId>,
}

/// `project_current` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRequest {
    /// Session to resolve; defaults to the tracked session.
    pub session_id: Option<SessionId>,
}

/// `project_info` request.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoRequest {
    /// Project id or name.
    pub project: String,
}

/// `project_insights` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRequest {
    /// Project scope; defaults to the session's active project.
    pub project_id: Option<ProjectId>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Creates a project.
pub(crate) async fn create(
    router: &ToolRouter,
    context: &DispatchContext,
    request: CreateRequest,
) -> Result<ToolOutput, ToolError> {
    let sql = format!(
        "INSERT INTO projects (id, name, description, status, metadata, created_at, updated_at) \
         VALUES ($1, $2, $3, 'active', $4, now(), now()) RETURNING {PROJECT_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Text(request.name),
        SqlParam::OptText(request.description),
        SqlParam::Json(request.metadata.unwrap_or_else(|| json!({}))),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::project(&row)?).unwrap_or_default()))
}

/// Lists projects with per-project entity counts.
pub(crate) async fn list(
    router: &ToolRouter,
    context: &DispatchContext,
    request: ListRequest,
) -> Result<ToolOutput, ToolError> {
    let include_archived = request.include_archived.unwrap_or(false);
    let sql = format!(
        "SELECT {PROJECT_COLUMNS}, \
         (SELECT count(*) FROM contexts c WHERE c.project_id = projects.id) AS context_count, \
         (SELECT count(*) FROM tasks t WHERE t.project_id = projects.id) AS task_count \
         FROM projects WHERE $1 OR status <> 'archived' ORDER BY name"
    );
    let rows = router
        .gateway()
        .fetch_all(&context.correlation_id, &sql, &[SqlParam::Bool(include_archived)])
        .await?;
    let mut projects = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut value = serde_json::to_value(rows::project(row)?).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.insert("contextCount".to_string(), count_column(row, "context_count"));
            object.insert("taskCount".to_string(), count_column(row, "task_count"));
        }
        projects.push(value);
    }
    Ok(ToolOutput::new(json!({ "projects": projects })))
}

/// Switches the session's active project.
pub(crate) async fn switch(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SwitchRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.find_project(context, &request.project).await?;
    let session = match request.session_id {
        Some(session) => session,
        None => router.ensure_session(context).await?,
    };
    router.active_projects().set(session, project.id);
    Ok(ToolOutput::new(json!({
        "project": project,
        "sessionId": session,
    })))
}

/// Resolves the session's active project.
pub(crate) async fn current(
    router: &ToolRouter,
    context: &DispatchContext,
    request: CurrentRequest,
) -> Result<ToolOutput, ToolError> {
    let session = request.session_id.or_else(|| router.current_session(context));
    let Some(session) = session else {
        return Ok(ToolOutput::new(json!({ "project": null, "sessionId": null })));
    };
    let Some(project_id) = router.active_projects().get(session) else {
        return Ok(ToolOutput::new(json!({ "project": null, "sessionId": session })));
    };
    let project = router.find_project(context, &project_id.to_string()).await?;
    Ok(ToolOutput::new(json!({
        "project": project,
        "sessionId": session,
    })))
}

/// Fetches project details with entity counts.
pub(crate) async fn info(
    router: &ToolRouter,
    context: &DispatchContext,
    request: InfoRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.find_project(context, &request.project).await?;
    let counts = router
        .gateway()
        .fetch_optional(
            &context.correlation_id,
            "SELECT \
             (SELECT count(*) FROM contexts WHERE project_id = $1) AS contexts, \
             (SELECT count(*) FROM tasks WHERE project_id = $1) AS tasks, \
             (SELECT count(*) FROM decisions WHERE project_id = $1) AS decisions, \
             (SELECT count(*) FROM naming_registry WHERE project_id = $1) AS naming_entries",
            &[SqlParam::Uuid(project.id.as_uuid())],
        )
        .await?;
    let counts = counts.map_or_else(
        || json!({}),
        |row| {
            json!({
                "contexts": count_column(&row, "contexts"),
                "tasks": count_column(&row, "tasks"),
                "decisions": count_column(&row, "decisions"),
                "namingEntries": count_column(&row, "naming_entries"),
            })
        },
    );
    Ok(ToolOutput::new(json!({
        "project": project,
        "counts": counts,
    })))
}

/// Derives cross-entity analytics for a project.
pub(crate) async fn insights(
    router: &ToolRouter,
    context: &DispatchContext,
    request: InsightsRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let contexts_by_type = grouped_counts(
        router,
        context,
        "SELECT context_type AS label, count(*) AS total FROM contexts \
         WHERE project_id = $1 GROUP BY context_type ORDER BY total DESC",
        project,
    )
    .await?;
    let tasks_by_status = grouped_counts(
        router,
        context,
        "SELECT status AS label, count(*) AS total FROM tasks \
         WHERE project_id = $1 GROUP BY status ORDER BY total DESC",
        project,
    )
    .await?;
    let decisions_by_status = grouped_counts(
        router,
        context,
        "SELECT status AS label, count(*) AS total FROM decisions \
         WHERE project_id = $1 GROUP BY status ORDER BY total DESC",
        project,
    )
    .await?;
    let top_tags = grouped_counts(
        router,
        context,
        "SELECT tag AS label, count(*) AS total FROM contexts, unnest(tags) AS tag \
         WHERE project_id = $1 GROUP BY tag ORDER BY total DESC LIMIT 5",
        project,
    )
    .await?;
    let recent = router
        .gateway()
        .fetch_optional(
            &context.correlation_id,
            "SELECT count(*) AS total FROM contexts \
             WHERE project_id = $1 AND created_at > now() - interval '7 days'",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "contextsByType": contexts_by_type,
        "tasksByStatus": tasks_by_status,
        "decisionsByStatus": decisions_by_status,
        "topTags": top_tags,
        "contextsLastSevenDays": recent.map_or(json!(0), |row| count_column(&row, "total")),
    })))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs a `label, total` aggregate and renders it as a JSON map.
async fn grouped_counts(
    router: &ToolRouter,
    context: &DispatchContext,
    sql: &str,
    project: ProjectId,
) -> Result<Value, ToolError> {
    let rows = router
        .gateway()
        .fetch_all(&context.correlation_id, sql, &[SqlParam::Uuid(project.as_uuid())])
        .await?;
    let mut map = serde_json::Map::new();
    for row in &rows {
        let label: String = sqlx::Row::try_get(row, "label")
            .map_err(|error| ToolError::Internal(format!("column label: {error}")))?;
        map.insert(label, count_column(row, "total"));
    }
    Ok(Value::Object(map))
}

/// Reads a `count(*)` column as JSON, tolerating driver integer widths.
pub(crate) fn count_column(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    sqlx::Row::try_get::<i64, _>(row, name).map_or(json!(0), |count| json!(count))
}
