// aidis-mcp/src/tools/agent.rs
// ============================================================================
// Module: Agent Tools
// Description: Agent registration, presence, sessions, and messaging.
// Purpose: Coordinate multiple agents working on the same project.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

use aidis_core::AgentStatus;
use aidis_core::ProjectId;
use aidis_core::SessionId;
use aidis_core::TaskId;
use aidis_core::ToolError;
use aidis_db::SqlParam;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;
use crate::tools::rows;

/// Column list shared by agent selects.
const AGENT_COLUMNS: &str = "id, name, agent_type, capabilities, status, last_seen";
/// Column list shared by message selects.
const MESSAGE_COLUMNS: &str =
    "id, from_agent, to_agent, message_type, title, content, task_refs, created_at";
/// Default page size for message listing.
const DEFAULT_MESSAGE_LIMIT: i64 = 50;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `agent_register` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Agent name.
    pub name: String,
    /// Free-form agent type label.
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
    /// Declared capability set.
    pub capabilities: Option<Vec<String>>,
}

/// `agent_status` request.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    /// Agent id or name.
    pub agent: String,
    /// New presence status.
    pub status: AgentStatus,
}

/// `agent_join` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Agent id or name.
    pub agent: String,
    /// Project to join; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Session the agent joins under.
    pub session_id: Option<SessionId>,
}

/// `agent_leave` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    /// Agent id or name.
    pub agent: String,
    /// Project to leave; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `agent_sessions` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `agent_message` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    /// Sending agent id or name.
    pub from_agent: String,
    /// Receiving agent id or name; broadcast when absent.
    pub to_agent: Option<String>,
    /// Free-form message type label.
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    /// Message title.
    pub title: String,
    /// Message body.
    pub content: String,
    /// Referenced tasks.
    pub task_refs: Option<Vec<TaskId>>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `agent_messages` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Restrict to one agent id or name.
    pub agent: Option<String>,
    /// Restrict to one message type.
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    /// Maximum results.
    pub limit: Option<i64>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Registers an agent, refreshing presence when the name exists.
pub(crate) async fn register(
    router: &ToolRouter,
    context: &DispatchContext,
    request: RegisterRequest,
) -> Result<ToolOutput, ToolError> {
    let sql = format!(
        "INSERT INTO agents (id, name, agent_type, capabilities, status, last_seen) \
         VALUES ($1, $2, $3, $4, 'active', now()) \
         ON CONFLICT (name) DO UPDATE SET \
           agent_type = EXCLUDED.agent_type, \
           capabilities = EXCLUDED.capabilities, \
           status = 'active', \
           last_seen = now() \
         RETURNING {AGENT_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Text(request.name),
        SqlParam::Text(request.agent_type.unwrap_or_else(|| "ai_assistant".to_string())),
        SqlParam::TextArray(request.capabilities.unwrap_or_default()),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("upsert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::agent(&row)?).unwrap_or_default()))
}

/// Lists registered agents.
pub(crate) async fn list(
    router: &ToolRouter,
    context: &DispatchContext,
) -> Result<ToolOutput, ToolError> {
    let sql = format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY name");
    let result_rows = router.gateway().fetch_all(&context.correlation_id, &sql, &[]).await?;
    let agents = result_rows
        .iter()
        .map(|row| rows::agent(row).map(|a| serde_json::to_value(a).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ToolOutput::new(json!({ "agents": agents })))
}

/// Updates an agent's presence status.
pub(crate) async fn set_status(
    router: &ToolRouter,
    context: &DispatchContext,
    request: StatusRequest,
) -> Result<ToolOutput, ToolError> {
    let agent = find_agent(router, context, &request.agent).await?;
    let sql = format!(
        "UPDATE agents SET status = $2, last_seen = now() WHERE id = $1 \
         RETURNING {AGENT_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(agent.id.as_uuid()),
        SqlParam::Text(request.status.as_str().to_string()),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::AgentNotFound(request.agent))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::agent(&row)?).unwrap_or_default()))
}

/// Joins an agent to a project session.
pub(crate) async fn join(
    router: &ToolRouter,
    context: &DispatchContext,
    request: JoinRequest,
) -> Result<ToolOutput, ToolError> {
    let agent = find_agent(router, context, &request.agent).await?;
    let project = router.resolve_project(context, request.project_id).await?;
    let open = router
        .gateway()
        .fetch_optional(
            &context.correlation_id,
            "SELECT id FROM agent_sessions \
             WHERE agent_id = $1 AND project_id = $2 AND left_at IS NULL",
            &[SqlParam::Uuid(agent.id.as_uuid()), SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    if open.is_none() {
        router
            .gateway()
            .execute(
                &context.correlation_id,
                "INSERT INTO agent_sessions (id, agent_id, project_id, session_id, joined_at) \
                 VALUES ($1, $2, $3, $4, now())",
                &[
                    SqlParam::Uuid(Uuid::new_v4()),
                    SqlParam::Uuid(agent.id.as_uuid()),
                    SqlParam::Uuid(project.as_uuid()),
                    SqlParam::OptUuid(request.session_id.map(|id| id.as_uuid())),
                ],
            )
            .await?;
    }
    router
        .gateway()
        .execute(
            &context.correlation_id,
            "UPDATE agents SET last_seen = now() WHERE id = $1",
            &[SqlParam::Uuid(agent.id.as_uuid())],
        )
        .await?;
    Ok(ToolOutput::new(json!({
        "agent": agent,
        "projectId": project,
        "joined": true,
    })))
}

/// Removes an agent from a project session.
pub(crate) async fn leave(
    router: &ToolRouter,
    context: &DispatchContext,
    request: LeaveRequest,
) -> Result<ToolOutput, ToolError> {
    let agent = find_agent(router, context, &request.agent).await?;
    let project = router.resolve_project(context, request.project_id).await?;
    let closed = router
        .gateway()
        .execute(
            &context.correlation_id,
            "UPDATE agent_sessions SET left_at = now() \
             WHERE agent_id = $1 AND project_id = $2 AND left_at IS NULL",
            &[SqlParam::Uuid(agent.id.as_uuid()), SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    Ok(ToolOutput::new(json!({
        "agent": agent,
        "projectId": project,
        "left": closed > 0,
    })))
}

/// Lists active agent sessions for a project.
pub(crate) async fn sessions(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SessionsRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let result_rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT a.id, a.name, a.agent_type, a.capabilities, a.status, a.last_seen, \
             s.joined_at, s.session_id \
             FROM agent_sessions s JOIN agents a ON a.id = s.agent_id \
             WHERE s.project_id = $1 AND s.left_at IS NULL ORDER BY s.joined_at",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    let mut sessions = Vec::with_capacity(result_rows.len());
    for row in &result_rows {
        let agent = rows::agent(row)?;
        let joined_at: chrono::DateTime<chrono::Utc> = sqlx::Row::try_get(row, "joined_at")
            .map_err(|error| ToolError::Internal(format!("column joined_at: {error}")))?;
        let session_id: Option<Uuid> = sqlx::Row::try_get(row, "session_id")
            .map_err(|error| ToolError::Internal(format!("column session_id: {error}")))?;
        sessions.push(json!({
            "agent": agent,
            "joinedAt": joined_at,
            "sessionId": session_id,
        }));
    }
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "sessions": sessions,
    })))
}

/// Sends a message between agents.
pub(crate) async fn message(
    router: &ToolRouter,
    context: &DispatchContext,
    request: MessageRequest,
) -> Result<ToolOutput, ToolError> {
    let from = find_agent(router, context, &request.from_agent).await?;
    let to = match &request.to_agent {
        Some(reference) => Some(find_agent(router, context, reference).await?),
        None => None,
    };
    let project = router.resolve_project(context, request.project_id).await?;
    let sql = format!(
        "INSERT INTO agent_messages \
         (id, project_id, from_agent, to_agent, message_type, title, content, task_refs, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now()) \
         RETURNING {MESSAGE_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::Uuid(from.id.as_uuid()),
        SqlParam::OptUuid(to.as_ref().map(|agent| agent.id.as_uuid())),
        SqlParam::Text(request.message_type.unwrap_or_else(|| "info".to_string())),
        SqlParam::Text(request.title),
        SqlParam::Text(request.content),
        SqlParam::UuidArray(
            request.task_refs.unwrap_or_default().iter().map(|id| id.as_uuid()).collect(),
        ),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::agent_message(&row)?).unwrap_or_default()))
}

/// Fetches agent messages with filters.
pub(crate) async fn messages(
    router: &ToolRouter,
    context: &DispatchContext,
    request: MessagesRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let agent_id = match &request.agent {
        Some(reference) => Some(find_agent(router, context, reference).await?.id),
        None => None,
    };
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM agent_messages \
         WHERE project_id = $1 \
           AND ($2::uuid IS NULL OR from_agent = $2 OR to_agent = $2) \
           AND ($3::text IS NULL OR message_type = $3) \
         ORDER BY created_at DESC LIMIT $4"
    );
    let params = [
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::OptUuid(agent_id.map(|id| id.as_uuid())),
        SqlParam::OptText(request.message_type),
        SqlParam::Int(request.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT)),
    ];
    let result_rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    let messages = result_rows
        .iter()
        .map(|row| rows::agent_message(row).map(|m| serde_json::to_value(m).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    let total = messages.len();
    Ok(ToolOutput::new(json!({ "messages": messages, "total": total })))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Finds an agent row by id-or-name reference.
async fn find_agent(
    router: &ToolRouter,
    context: &DispatchContext,
    reference: &str,
) -> Result<aidis_core::Agent, ToolError> {
    let id = Uuid::parse_str(reference).ok();
    let sql = format!(
        "SELECT {AGENT_COLUMNS} FROM agents \
         WHERE ($1::uuid IS NOT NULL AND id = $1) OR name = $2"
    );
    let params = [SqlParam::OptUuid(id), SqlParam::Text(reference.to_string())];
    let row = router.gateway().fetch_optional(&context.correlation_id, &sql, &params).await?;
    row.map(|row| rows::agent(&row))
        .transpose()?
        .ok_or_else(|| ToolError::AgentNotFound(reference.to_string()))
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

    use aidis_core::AgentStatus;
    use serde_json::json;

    use super::MessageRequest;
    use super::StatusRequest;

    #[test]
    fn message_requests_decode_from_camel_case_wire_fields() {
        let request: MessageRequest = serde_json::from_value(json!({
            "fromAgent": "scout",
            "toAgent": "builder",
            "type": "handoff",
            "title": "breaker wiring",
            "content": "gateway retries are in place",
            "taskRefs": ["7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1"]
        }))
        .expect("decode");
        assert_eq!(request.from_agent, "scout");
        assert_eq!(request.to_agent.as_deref(), Some("builder"));
        assert_eq!(request.message_type.as_deref(), Some("handoff"));
        assert_eq!(request.task_refs.expect("refs").len(), 1);
    }

    #[test]
    fn status_requests_decode_presence_labels() {
        let request: StatusRequest =
            serde_json::from_value(json!({ "agent": "scout", "status": "busy" }))
                .expect("decode");
        assert_eq!(request.status, AgentStatus::Busy);
    }
}
