// aidis-mcp/src/tools/search.rs
// ============================================================================
// Module: Search Tools
// Description: Unified cross-entity search and derived recommendations.
// Purpose: One query across contexts, decisions, naming, and code.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

//! ## Overview
//! `smart_search` fans one query across four sources: contexts by vector
//! similarity, decisions and naming by keyword, and the code components
//! table populated by external analysis pipelines. Each source reports
//! relevance in `[0, 1]`; results merge and return ordered by relevance
//! descending. `get_recommendations` is read-only analytics over the same
//! tables.

use aidis_core::EmbeddingError;
use aidis_core::ProjectId;
use aidis_core::ToolError;
use aidis_db::SqlParam;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use sqlx::Row;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;
use crate::tools::project::count_column;

/// Default merged result count.
const DEFAULT_LIMIT: usize = 20;
/// Longest snippet returned per result.
const SNIPPET_LENGTH: usize = 160;
/// Age after which an in-progress task counts as stale.
const STALE_TASK_DAYS: i32 = 7;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Sources `smart_search` can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// Stored contexts, by vector similarity.
    Contexts,
    /// Recorded decisions, by keyword.
    Decisions,
    /// Naming registry, by keyword.
    Naming,
    /// Code components, by keyword.
    Code,
}

/// `smart_search` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSearchRequest {
    /// Search text.
    pub query: String,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Sources to search; all when omitted.
    pub include: Option<Vec<SearchSource>>,
    /// Maximum merged results.
    pub limit: Option<usize>,
}

/// `get_recommendations` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
    /// Optional focus area.
    pub focus: Option<String>,
}

/// One merged search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Source the hit came from.
    pub source: &'static str,
    /// Row identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Content snippet.
    pub snippet: String,
    /// Normalized relevance in `[0, 1]`.
    pub relevance: f64,
}

// ============================================================================
// SECTION: Smart Search
// ============================================================================

/// Searches contexts, decisions, naming, and code together.
pub(crate) async fn smart_search(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SmartSearchRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let sources = request.include.unwrap_or_else(|| {
        vec![
            SearchSource::Contexts,
            SearchSource::Decisions,
            SearchSource::Naming,
            SearchSource::Code,
        ]
    });
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    let mut hits: Vec<SearchHit> = Vec::new();
    if sources.contains(&SearchSource::Contexts) {
        hits.extend(context_hits(router, context, project, &request.query, limit).await?);
    }
    if sources.contains(&SearchSource::Decisions) {
        hits.extend(decision_hits(router, context, project, &request.query, limit).await?);
    }
    if sources.contains(&SearchSource::Naming) {
        hits.extend(naming_hits(router, context, project, &request.query, limit).await?);
    }
    if sources.contains(&SearchSource::Code) {
        hits.extend(code_hits(router, context, project, &request.query, limit).await?);
    }
    let hits = rank(hits, limit);
    let total = hits.len();
    Ok(ToolOutput::new(json!({
        "query": request.query,
        "results": hits,
        "total": total,
    })))
}

/// Vector hits from stored contexts.
async fn context_hits(
    router: &ToolRouter,
    context: &DispatchContext,
    project: ProjectId,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let embedding = router
        .embedder()
        .embed(query)
        .await
        .map_err(|error: EmbeddingError| ToolError::EmbeddingUnavailable(error.to_string()))?;
    let mut literal = String::with_capacity(embedding.vector.len() * 8 + 2);
    literal.push('[');
    for (index, value) in embedding.vector.iter().enumerate() {
        if index > 0 {
            literal.push(',');
        }
        literal.push_str(&value.to_string());
    }
    literal.push(']');
    let rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT id, content, 1 - (embedding <=> $1::vector) AS similarity \
             FROM contexts WHERE project_id = $2 \
             ORDER BY embedding <=> $1::vector ASC LIMIT $3",
            &[
                SqlParam::Text(literal),
                SqlParam::Uuid(project.as_uuid()),
                SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
            ],
        )
        .await?;
    let mut hits = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: uuid::Uuid = row
            .try_get("id")
            .map_err(|error| ToolError::Internal(format!("column id: {error}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|error| ToolError::Internal(format!("column content: {error}")))?;
        let similarity: f64 = row
            .try_get("similarity")
            .map_err(|error| ToolError::Internal(format!("column similarity: {error}")))?;
        hits.push(SearchHit {
            source: "contexts",
            id: id.to_string(),
            title: snippet(&content, 60),
            snippet: snippet(&content, SNIPPET_LENGTH),
            relevance: similarity.clamp(0.0, 1.0),
        });
    }
    Ok(hits)
}

/// Keyword hits from recorded decisions.
async fn decision_hits(
    router: &ToolRouter,
    context: &DispatchContext,
    project: ProjectId,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let pattern = format!("%{query}%");
    let rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT id, title, decision, \
             CASE WHEN title ILIKE $2 THEN 0.9 ELSE 0.6 END AS relevance \
             FROM decisions \
             WHERE project_id = $1 AND (title ILIKE $2 OR problem ILIKE $2 \
                   OR decision ILIKE $2 OR rationale ILIKE $2) \
             ORDER BY relevance DESC, created_at DESC LIMIT $3",
            &[
                SqlParam::Uuid(project.as_uuid()),
                SqlParam::Text(pattern),
                SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
            ],
        )
        .await?;
    keyword_hits(&rows, "decisions", "title", "decision")
}

/// Keyword hits from the naming registry.
async fn naming_hits(
    router: &ToolRouter,
    context: &DispatchContext,
    project: ProjectId,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let pattern = format!("%{query}%");
    let rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT id, canonical_name AS title, coalesce(description, '') AS body, \
             CASE WHEN canonical_name ILIKE $2 THEN 0.8 ELSE 0.5 END AS relevance \
             FROM naming_registry \
             WHERE project_id = $1 AND (canonical_name ILIKE $2 \
                   OR array_to_string(aliases, ' ') ILIKE $2 \
                   OR coalesce(description, '') ILIKE $2) \
             ORDER BY relevance DESC, usage_count DESC LIMIT $3",
            &[
                SqlParam::Uuid(project.as_uuid()),
                SqlParam::Text(pattern),
                SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
            ],
        )
        .await?;
    keyword_hits(&rows, "naming", "title", "body")
}

/// Keyword hits from code components.
async fn code_hits(
    router: &ToolRouter,
    context: &DispatchContext,
    project: ProjectId,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let pattern = format!("%{query}%");
    let rows = router
        .gateway()
        .fetch_all(
            &context.correlation_id,
            "SELECT id, name AS title, file_path AS body, \
             CASE WHEN name ILIKE $2 THEN 0.7 ELSE 0.4 END AS relevance \
             FROM code_components \
             WHERE project_id = $1 AND (name ILIKE $2 OR file_path ILIKE $2) \
             ORDER BY relevance DESC, name LIMIT $3",
            &[
                SqlParam::Uuid(project.as_uuid()),
                SqlParam::Text(pattern),
                SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
            ],
        )
        .await?;
    keyword_hits(&rows, "code", "title", "body")
}

/// Orders merged hits by relevance descending and truncates to `limit`.
fn rank(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

/// Converts keyword rows into hits.
fn keyword_hits(
    rows: &[sqlx::postgres::PgRow],
    source: &'static str,
    title_column: &str,
    body_column: &str,
) -> Result<Vec<SearchHit>, ToolError> {
    let mut hits = Vec::with_capacity(rows.len());
    for row in rows {
        let id: uuid::Uuid = row
            .try_get("id")
            .map_err(|error| ToolError::Internal(format!("column id: {error}")))?;
        let title: String = row
            .try_get(title_column)
            .map_err(|error| ToolError::Internal(format!("column {title_column}: {error}")))?;
        let body: String = row
            .try_get(body_column)
            .map_err(|error| ToolError::Internal(format!("column {body_column}: {error}")))?;
        let relevance: f64 = row
            .try_get("relevance")
            .map_err(|error| ToolError::Internal(format!("column relevance: {error}")))?;
        hits.push(SearchHit {
            source,
            id: id.to_string(),
            title,
            snippet: snippet(&body, SNIPPET_LENGTH),
            relevance: relevance.clamp(0.0, 1.0),
        });
    }
    Ok(hits)
}

/// Truncates text to a display snippet on a character boundary.
fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

// ============================================================================
// SECTION: Recommendations
// ============================================================================

/// Derives read-only recommendations from stored data.
pub(crate) async fn recommendations(
    router: &ToolRouter,
    context: &DispatchContext,
    request: RecommendationsRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let row = router
        .gateway()
        .fetch_optional(
            &context.correlation_id,
            "SELECT \
             (SELECT count(*) FROM tasks WHERE project_id = $1 AND status = 'in_progress' \
              AND started_at < now() - make_interval(days => $2::int)) AS stale_tasks, \
             (SELECT count(*) FROM tasks WHERE project_id = $1 AND status = 'blocked') AS blocked_tasks, \
             (SELECT count(*) FROM contexts WHERE project_id = $1 \
              AND cardinality(tags) = 0) AS untagged_contexts, \
             (SELECT count(*) FROM decisions WHERE project_id = $1 \
              AND status = 'under_review') AS decisions_under_review, \
             (SELECT count(*) FROM naming_registry WHERE project_id = $1 \
              AND deprecated AND usage_count > 0) AS deprecated_names_in_use",
            &[SqlParam::Uuid(project.as_uuid()), SqlParam::Int(i64::from(STALE_TASK_DAYS))],
        )
        .await?
        .ok_or_else(|| ToolError::Internal("aggregate returned no row".to_string()))?;
    let mut recommendations = Vec::new();
    push_recommendation(
        &mut recommendations,
        count_column(&row, "stale_tasks").as_i64().unwrap_or(0),
        "tasks",
        "high",
        |count| format!("{count} in-progress task(s) have been open for over a week; revisit or split them"),
    );
    push_recommendation(
        &mut recommendations,
        count_column(&row, "blocked_tasks").as_i64().unwrap_or(0),
        "tasks",
        "medium",
        |count| format!("{count} task(s) are blocked; check their dependencies"),
    );
    push_recommendation(
        &mut recommendations,
        count_column(&row, "untagged_contexts").as_i64().unwrap_or(0),
        "contexts",
        "low",
        |count| format!("{count} context(s) have no tags; tagging improves search"),
    );
    push_recommendation(
        &mut recommendations,
        count_column(&row, "decisions_under_review").as_i64().unwrap_or(0),
        "decisions",
        "medium",
        |count| format!("{count} decision(s) are under review; resolve or supersede them"),
    );
    push_recommendation(
        &mut recommendations,
        count_column(&row, "deprecated_names_in_use").as_i64().unwrap_or(0),
        "naming",
        "medium",
        |count| format!("{count} deprecated name(s) are still in use; migrate call sites"),
    );
    if let Some(focus) = &request.focus {
        apply_focus(&mut recommendations, focus);
    }
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "recommendations": recommendations,
    })))
}

/// Drops recommendations whose type does not match the focus area.
fn apply_focus(recommendations: &mut Vec<serde_json::Value>, focus: &str) {
    let focus = focus.to_lowercase();
    recommendations.retain(|r| r["type"].as_str().is_some_and(|t| t.contains(&focus)));
}

/// Appends one recommendation when its trigger count is positive.
fn push_recommendation(
    recommendations: &mut Vec<serde_json::Value>,
    count: i64,
    kind: &str,
    priority: &str,
    message: impl Fn(i64) -> String,
) {
    if count > 0 {
        recommendations.push(json!({
            "type": kind,
            "priority": priority,
            "message": message(count),
        }));
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

    use serde_json::json;

    use super::SearchHit;
    use super::apply_focus;
    use super::push_recommendation;
    use super::rank;
    use super::snippet;

    fn hit(source: &'static str, id: &str, relevance: f64) -> SearchHit {
        SearchHit {
            source,
            id: id.to_string(),
            title: id.to_string(),
            snippet: String::new(),
            relevance,
        }
    }

    #[test]
    fn snippets_truncate_on_character_boundaries() {
        assert_eq!(snippet("short", 10), "short");
        let long = "x".repeat(200);
        let cut = snippet(&long, 160);
        assert_eq!(cut.chars().count(), 161);
        assert!(cut.ends_with('…'));
        assert_eq!(snippet("héllo wörld", 5), "héllo…");
    }

    #[test]
    fn rank_merges_sources_by_relevance_descending() {
        let hits = vec![
            hit("decisions", "d1", 0.6),
            hit("contexts", "c1", 0.95),
            hit("code", "k1", 0.4),
            hit("naming", "n1", 0.8),
        ];
        let ranked = rank(hits, 10);
        let order: Vec<&str> = ranked.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(order, vec!["c1", "n1", "d1", "k1"]);
    }

    #[test]
    fn rank_truncates_to_the_limit() {
        let hits = vec![
            hit("contexts", "c1", 0.9),
            hit("contexts", "c2", 0.8),
            hit("contexts", "c3", 0.7),
        ];
        let ranked = rank(hits, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].id, "c2");
    }

    #[test]
    fn recommendations_skip_zero_counts() {
        let mut recommendations = Vec::new();
        push_recommendation(&mut recommendations, 0, "tasks", "high", |count| {
            format!("{count} stale")
        });
        assert!(recommendations.is_empty());
        push_recommendation(&mut recommendations, 3, "tasks", "high", |count| {
            format!("{count} stale")
        });
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0]["message"], json!("3 stale"));
        assert_eq!(recommendations[0]["priority"], json!("high"));
    }

    #[test]
    fn focus_filters_by_recommendation_type() {
        let mut recommendations = vec![
            json!({ "type": "tasks", "priority": "high", "message": "stale" }),
            json!({ "type": "naming", "priority": "medium", "message": "deprecated" }),
        ];
        apply_focus(&mut recommendations, "Tasks");
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0]["type"], json!("tasks"));
    }
}
