// aidis-mcp/src/tools/decision.rs
// ============================================================================
// Module: Decision Tools
// Description: Technical decision recording, search, update, and stats.
// Purpose: Keep the project's decision log queryable.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

use aidis_core::DecisionAlternative;
use aidis_core::DecisionId;
use aidis_core::DecisionStatus;
use aidis_core::ImpactLevel;
use aidis_core::ProjectId;
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

/// Column list shared by decision selects.
const DECISION_COLUMNS: &str = "id, project_id, title, problem, decision, rationale, alternatives, \
     status, impact_level, created_at, updated_at";
/// Default page size for decision search.
const DEFAULT_LIMIT: i64 = 20;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `decision_record` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    /// Short decision title.
    pub title: String,
    /// Problem statement.
    pub problem: String,
    /// Decision taken.
    pub decision: String,
    /// Why this decision was taken.
    pub rationale: Option<String>,
    /// Alternatives considered, in order.
    pub alternatives: Option<Vec<DecisionAlternative>>,
    /// Impact level.
    pub impact_level: Option<ImpactLevel>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `decision_search` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Keyword query.
    pub query: Option<String>,
    /// Restrict to one status.
    pub status: Option<DecisionStatus>,
    /// Restrict to one impact level.
    pub impact_level: Option<ImpactLevel>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// `decision_update` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Decision to update.
    pub decision_id: DecisionId,
    /// New status.
    pub status: Option<DecisionStatus>,
    /// Updated rationale.
    pub rationale: Option<String>,
}

/// `decision_stats` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Records a decision.
pub(crate) async fn record(
    router: &ToolRouter,
    context: &DispatchContext,
    request: RecordRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let alternatives =
        serde_json::to_value(request.alternatives.unwrap_or_default()).unwrap_or_else(|_| json!([]));
    let sql = format!(
        "INSERT INTO decisions \
         (id, project_id, title, problem, decision, rationale, alternatives, status, impact_level, \
          created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', $8, now(), now()) \
         RETURNING {DECISION_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::Text(request.title),
        SqlParam::Text(request.problem),
        SqlParam::Text(request.decision),
        SqlParam::Text(request.rationale.unwrap_or_default()),
        SqlParam::Json(alternatives),
        SqlParam::Text(request.impact_level.unwrap_or(ImpactLevel::Medium).as_str().to_string()),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::decision(&row)?).unwrap_or_default()))
}

/// Keyword search over recorded decisions.
pub(crate) async fn search(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SearchRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let pattern = request.query.map(|query| format!("%{query}%"));
    let sql = format!(
        "SELECT {DECISION_COLUMNS} FROM decisions \
         WHERE project_id = $1 \
           AND ($2::text IS NULL OR title ILIKE $2 OR problem ILIKE $2 \
                OR decision ILIKE $2 OR rationale ILIKE $2) \
           AND ($3::text IS NULL OR status = $3) \
           AND ($4::text IS NULL OR impact_level = $4) \
         ORDER BY created_at DESC LIMIT $5 OFFSET $6"
    );
    let params = [
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::OptText(pattern),
        SqlParam::OptText(request.status.map(|s| s.as_str().to_string())),
        SqlParam::OptText(request.impact_level.map(|i| i.as_str().to_string())),
        SqlParam::Int(request.limit.unwrap_or(DEFAULT_LIMIT)),
        SqlParam::Int(request.offset.unwrap_or(0)),
    ];
    let result_rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    let decisions = result_rows
        .iter()
        .map(|row| rows::decision(row).map(|d| serde_json::to_value(d).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    let total = decisions.len();
    Ok(ToolOutput::new(json!({ "decisions": decisions, "total": total })))
}

/// Updates a decision's status or rationale.
pub(crate) async fn update(
    router: &ToolRouter,
    context: &DispatchContext,
    request: UpdateRequest,
) -> Result<ToolOutput, ToolError> {
    let sql = format!(
        "UPDATE decisions SET \
         status = COALESCE($2, status), \
         rationale = COALESCE($3, rationale), \
         updated_at = now() \
         WHERE id = $1 RETURNING {DECISION_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(request.decision_id.as_uuid()),
        SqlParam::OptText(request.status.map(|s| s.as_str().to_string())),
        SqlParam::OptText(request.rationale),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::DecisionNotFound(request.decision_id.to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::decision(&row)?).unwrap_or_default()))
}

/// Decision counts grouped by status and impact.
pub(crate) async fn stats(
    router: &ToolRouter,
    context: &DispatchContext,
    request: StatsRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let by_status = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT status AS label, count(*) AS total FROM decisions \
             WHERE project_id = $1 GROUP BY status",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    let by_impact = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT impact_level AS label, count(*) AS total FROM decisions \
             WHERE project_id = $1 GROUP BY impact_level",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    let mut total: i64 = 0;
    let mut status_map = serde_json::Map::new();
    for row in &by_status {
        let label: String = sqlx::Row::try_get(row, "label")
            .map_err(|error| ToolError::Internal(format!("column label: {error}")))?;
        let count = count_column(row, "total");
        total += count.as_i64().unwrap_or(0);
        status_map.insert(label, count);
    }
    let mut impact_map = serde_json::Map::new();
    for row in &by_impact {
        let label: String = sqlx::Row::try_get(row, "label")
            .map_err(|error| ToolError::Internal(format!("column label: {error}")))?;
        impact_map.insert(label, count_column(row, "total"));
    }
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "total": total,
        "byStatus": status_map,
        "byImpact": impact_map,
    })))
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

    use aidis_core::DecisionStatus;
    use aidis_core::ImpactLevel;
    use serde_json::json;

    use super::RecordRequest;
    use super::UpdateRequest;

    #[test]
    fn record_requests_decode_with_alternative_defaults() {
        let request: RecordRequest = serde_json::from_value(json!({
            "title": "Adopt sqlx",
            "problem": "the store is synchronous",
            "decision": "move the gateway to sqlx",
            "impactLevel": "high",
            "alternatives": [
                { "name": "keep r2d2", "description": "stay synchronous" }
            ]
        }))
        .expect("decode");
        assert_eq!(request.impact_level, Some(ImpactLevel::High));
        let alternatives = request.alternatives.expect("alternatives");
        assert_eq!(alternatives.len(), 1);
        assert!(alternatives[0].pros.is_empty());
        assert!(alternatives[0].cons.is_empty());
    }

    #[test]
    fn update_requests_decode_status_labels() {
        let request: UpdateRequest = serde_json::from_value(json!({
            "decisionId": "7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1",
            "status": "superseded"
        }))
        .expect("decode");
        assert_eq!(request.status, Some(DecisionStatus::Superseded));
        assert!(request.rationale.is_none());
    }
}
