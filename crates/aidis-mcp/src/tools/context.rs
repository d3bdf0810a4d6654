// aidis-mcp/src/tools/context.rs
// ============================================================================
// Module: Context Tools
// Description: Context storage and vector-similarity retrieval.
// Purpose: Persist development context with embeddings; find it again.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

//! ## Overview
//! `context_store` computes the embedding through the configured provider
//! and inserts the row; `context_search` embeds the query and orders by
//! ascending vector distance in-database. Similarity surfaces to clients
//! in `[0, 100]`. Tag filtering uses array set-overlap.

use aidis_core::ContextType;
use aidis_core::EmbeddingError;
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
use crate::tools::project::count_column;
use crate::tools::rows;

/// Column list shared by context selects.
const CONTEXT_COLUMNS: &str =
    "id, project_id, session_id, context_type, content, tags, relevance_score, metadata, created_at";
/// Default page size for search and recency queries.
const DEFAULT_LIMIT: i64 = 10;
/// Default relevance score when the client does not assign one.
const DEFAULT_RELEVANCE: f64 = 5.0;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `context_store` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    /// Context classification.
    #[serde(rename = "type")]
    pub context_type: ContextType,
    /// Context body.
    pub content: String,
    /// Tags attached to the context.
    pub tags: Option<Vec<String>>,
    /// Relevance score assigned at store time.
    pub relevance_score: Option<f64>,
    /// Free-form metadata bag.
    pub metadata: Option<Value>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Session the context belongs to.
    pub session_id: Option<SessionId>,
}

/// `context_search` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Search text.
    pub query: String,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Restrict to one context type.
    #[serde(rename = "type")]
    pub context_type: Option<ContextType>,
    /// Require set-overlap with these tags.
    pub tags: Option<Vec<String>>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Minimum similarity in `[0, 1]`.
    pub min_similarity: Option<f64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// `context_get_recent` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Maximum results.
    pub limit: Option<i64>,
}

/// `context_stats` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Stores a context row with its embedding.
pub(crate) async fn store(
    router: &ToolRouter,
    context: &DispatchContext,
    request: StoreRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let session = request.session_id.or_else(|| router.current_session(context));
    let embedding = router
        .embedder()
        .embed(&request.content)
        .await
        .map_err(embedding_error)?;
    let sql = format!(
        "INSERT INTO contexts \
         (id, project_id, session_id, context_type, content, tags, relevance_score, metadata, embedding, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::vector, now()) \
         RETURNING {CONTEXT_COLUMNS}"
    );
    let params = [
        SqlParam::Uuid(Uuid::new_v4()),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::OptUuid(session.map(|id| id.as_uuid())),
        SqlParam::Text(request.context_type.as_str().to_string()),
        SqlParam::Text(request.content),
        SqlParam::TextArray(request.tags.unwrap_or_default()),
        SqlParam::Float(request.relevance_score.unwrap_or(DEFAULT_RELEVANCE)),
        SqlParam::Json(request.metadata.unwrap_or_else(|| json!({}))),
        SqlParam::Text(vector_literal(&embedding.vector)),
    ];
    let row = router
        .gateway()
        .fetch_optional(&context.correlation_id, &sql, &params)
        .await?
        .ok_or_else(|| ToolError::Internal("insert returned no row".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::context_entry(&row)?).unwrap_or_default()))
}

/// Vector-similarity search over stored contexts.
pub(crate) async fn search(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SearchRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let embedding = router.embedder().embed(&request.query).await.map_err(embedding_error)?;
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    let min_similarity = request.min_similarity.unwrap_or(0.0);
    let sql = format!(
        "SELECT {CONTEXT_COLUMNS}, 1 - (embedding <=> $1::vector) AS similarity \
         FROM contexts \
         WHERE project_id = $2 \
           AND ($3::text IS NULL OR context_type = $3) \
           AND (cardinality($4::text[]) = 0 OR tags && $4::text[]) \
           AND 1 - (embedding <=> $1::vector) >= $5 \
         ORDER BY embedding <=> $1::vector ASC \
         LIMIT $6 OFFSET $7"
    );
    let params = [
        SqlParam::Text(vector_literal(&embedding.vector)),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::OptText(request.context_type.map(|t| t.as_str().to_string())),
        SqlParam::TextArray(request.tags.unwrap_or_default()),
        SqlParam::Float(min_similarity),
        SqlParam::Int(limit),
        SqlParam::Int(request.offset.unwrap_or(0)),
    ];
    let rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    let mut results = Vec::with_capacity(rows.len());
    for row in &rows {
        let similarity: f64 = sqlx::Row::try_get(row, "similarity")
            .map_err(|error| ToolError::Internal(format!("column similarity: {error}")))?;
        let mut value = serde_json::to_value(rows::context_entry(row)?).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "similarity".to_string(),
                json!((similarity * 100.0 * 100.0).round() / 100.0),
            );
        }
        results.push(value);
    }
    let total = results.len();
    Ok(ToolOutput::new(json!({
        "results": results,
        "query": request.query,
        "total": total,
    })))
}

/// Most recent contexts for the project.
pub(crate) async fn get_recent(
    router: &ToolRouter,
    context: &DispatchContext,
    request: RecentRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let sql = format!(
        "SELECT {CONTEXT_COLUMNS} FROM contexts \
         WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2"
    );
    let params = [
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::Int(request.limit.unwrap_or(DEFAULT_LIMIT)),
    ];
    let rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    let contexts = rows
        .iter()
        .map(|row| rows::context_entry(row).map(|entry| serde_json::to_value(entry).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ToolOutput::new(json!({ "contexts": contexts })))
}

/// Context counts grouped by type.
pub(crate) async fn stats(
    router: &ToolRouter,
    context: &DispatchContext,
    request: StatsRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT context_type, count(*) AS total FROM contexts \
             WHERE project_id = $1 GROUP BY context_type ORDER BY total DESC",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    let mut by_type = serde_json::Map::new();
    let mut total: i64 = 0;
    for row in &rows {
        let label: String = sqlx::Row::try_get(row, "context_type")
            .map_err(|error| ToolError::Internal(format!("column context_type: {error}")))?;
        let count = count_column(row, "total");
        total += count.as_i64().unwrap_or(0);
        by_type.insert(label, count);
    }
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "total": total,
        "byType": by_type,
    })))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a vector as the pgvector text literal.
fn vector_literal(vector: &[f32]) -> String {
    let mut literal = String::with_capacity(vector.len() * 8 + 2);
    literal.push('[');
    for (index, value) in vector.iter().enumerate() {
        if index > 0 {
            literal.push(',');
        }
        literal.push_str(&value.to_string());
    }
    literal.push(']');
    literal
}

/// Maps embedding failures onto the tool taxonomy.
fn embedding_error(error: EmbeddingError) -> ToolError {
    ToolError::EmbeddingUnavailable(error.to_string())
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

    use super::vector_literal;

    #[test]
    fn vector_literal_matches_pgvector_syntax() {
        assert_eq!(vector_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
