// aidis-mcp/src/tools/session.rs
// ============================================================================
// Module: Session Tools
// Description: Tracked-session lifecycle and attributes.
// Purpose: Create, inspect, assign, and close the tracked session.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

use aidis_core::ProjectId;
use aidis_core::SessionId;
use aidis_core::ToolError;
use aidis_db::SqlParam;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;
use crate::tools::project::count_column;
use crate::tools::rows;

/// Column list shared by session selects.
const SESSION_COLUMNS: &str = "id, project_id, started_at, ended_at, productivity_score";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `session_new` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    /// Project the new session belongs to.
    pub project_id: Option<ProjectId>,
    /// Optional session title.
    pub title: Option<String>,
}

/// `session_assign` request.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    /// Project id or name.
    pub project: String,
}

/// `session_update` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Session to update; defaults to the tracked session.
    pub session_id: Option<SessionId>,
    /// Productivity score.
    pub productivity_score: Option<f64>,
    /// Close the session.
    pub ended: Option<bool>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Starts a new tracked session.
pub(crate) async fn new_session(
    router: &ToolRouter,
    context: &DispatchContext,
    request: NewRequest,
) -> Result<ToolOutput, ToolError> {
    if let Some(project) = request.project_id {
        // Referential failure surfaces before the insert.
        let _ = router.resolve_project(context, Some(project)).await?;
    }
    let session = SessionId::new();
    let sql = format!(
        "INSERT INTO sessions (id, project_id, title, started_at) \
         VALUES ($1, $2, $3, now()) RETURNING {SESSION_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(session.as_uuid()),
        SqlParam::OptUuid(request.project_id.map(|id| id.as_uuid())),
        SqlParam::OptText(request.title),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    router.tracker().set_active(session);
    if let Some(project) = request.project_id {
        router.active_projects().set(session, project);
    }
    Ok(ToolOutput::new(json!({ "session": rows::session(&row)? })))
}

/// Reports the tracked session's status.
pub(crate) async fn status(
    router: &ToolRouter,
    context: &DispatchContext,
) -> Result<ToolOutput, ToolError> {
    let Some(session) = router.current_session(context) else {
        return Ok(ToolOutput::new(json!({ "session": null })));
    };
    let sql = format!(
        "SELECT {SESSION_COLUMNS}, \
         (SELECT count(*) FROM session_activities a WHERE a.session_id = sessions.id) AS activities \
         FROM sessions WHERE id = $1"
    );
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &[SqlParam::Uuid(session.as_uuid())])
        .await?
        .ok_or_else(|| ToolError::SessionNotFound(session.to_string()))?;
    let active_project = router.active_projects().get(session);
    Ok(ToolOutput::new(json!({
        "session": rows::session(&row)?,
        "activeProject": active_project,
        "activityCount": count_column(&row, "activities"),
    })))
}

/// Assigns the tracked session to a project.
pub(crate) async fn assign(
    router: &ToolRouter,
    context: &DispatchContext,
    request: AssignRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.find_project(context, &request.project).await?;
    let session = router.ensure_session(context).await?;
    router
        .gateway()
        .execute(
            &context.correlation_id,
            "UPDATE sessions SET project_id = $2 WHERE id = $1",
            &[SqlParam::Uuid(session.as_uuid()), SqlParam::Uuid(project.id.as_uuid())],
        )
        .await?;
    router.active_projects().set(session, project.id);
    Ok(ToolOutput::new(json!({
        "sessionId": session,
        "project": project,
    })))
}

/// Updates tracked session attributes and optionally closes it.
pub(crate) async fn update(
    router: &ToolRouter,
    context: &DispatchContext,
    request: UpdateRequest,
) -> Result<ToolOutput, ToolError> {
    let session = request
        .session_id
        .or_else(|| router.current_session(context))
        .ok_or_else(|| ToolError::SessionNotFound("no tracked session".to_string()))?;
    let ended = request.ended.unwrap_or(false);
    let sql = format!(
        "UPDATE sessions SET \
         productivity_score = COALESCE($2, productivity_score), \
         ended_at = CASE WHEN $3 AND ended_at IS NULL THEN now() ELSE ended_at END \
         WHERE id = $1 RETURNING {SESSION_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(session.as_uuid()),
        SqlParam::OptFloat(request.productivity_score),
        SqlParam::Bool(ended),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::SessionNotFound(session.to_string()))?;
    if ended {
        router.tracker().clear_active(session);
        router.active_projects().clear(session);
    }
    Ok(ToolOutput::new(json!({ "session": rows::session(&row)? })))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a session id from its string form.
#[must_use]
pub(crate) fn parse_session(value: &str) -> Option<SessionId> {
    Uuid::parse_str(value).ok().map(SessionId::from_uuid)
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

    use serde_json::json;

    use super::UpdateRequest;
    use super::parse_session;

    #[test]
    fn session_ids_parse_from_canonical_uuids() {
        let parsed = parse_session("7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1").expect("session id");
        assert_eq!(parsed.to_string(), "7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1");
    }

    #[test]
    fn malformed_session_ids_are_rejected() {
        assert!(parse_session("not-a-session").is_none());
        assert!(parse_session("").is_none());
    }

    #[test]
    fn update_requests_decode_from_camel_case_wire_fields() {
        let request: UpdateRequest =
            serde_json::from_value(json!({ "productivityScore": 80.0, "ended": true }))
                .expect("decode");
        assert_eq!(request.productivity_score, Some(80.0));
        assert_eq!(request.ended, Some(true));
        assert!(request.session_id.is_none());
    }
}
