// aidis-mcp/src/tools/naming.rs
// ============================================================================
// Module: Naming Tools
// Description: Naming registry checks, registration, and suggestions.
// Purpose: Keep project names consistent and collision-free.
// Dependencies: aidis-core, aidis-db, serde, serde_json
// ============================================================================

//! ## Overview
//! `naming_check` evaluates a proposed name against every registered entry
//! for the same project and entity type. Exact canonical matches and alias
//! collisions are errors; similar names and convention violations are
//! warnings. `naming_register` runs the same evaluation inside one
//! transaction and aborts on any error-severity conflict, attaching
//! warnings to the envelope otherwise.

use aidis_core::NamingConflict;
use aidis_core::NamingConflictSeverity;
use aidis_core::NamingConflictType;
use aidis_core::NamingEntityType;
use aidis_core::NamingEntry;
use aidis_core::NamingId;
use aidis_core::ProjectId;
use aidis_core::ToolError;
use aidis_core::naming::NamingConvention;
use aidis_core::naming::SIMILAR_NAME_THRESHOLD;
use aidis_core::naming::extract_keywords;
use aidis_core::naming::name_similarity;
use aidis_core::naming::split_words;
use aidis_db::SqlParam;
use aidis_db::gateway::tx_execute;
use aidis_db::gateway::tx_fetch_all;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::tools::DispatchContext;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;
use crate::tools::project::count_column;
use crate::tools::rows;

/// Column list shared by naming selects.
const NAMING_COLUMNS: &str = "id, project_id, entity_type, canonical_name, aliases, description, \
     convention, usage_count, deprecated, deprecated_reason, related_entity_ids, \
     created_at, updated_at";
/// Maximum suggestions returned by `naming_suggest`.
const MAX_SUGGESTIONS: usize = 8;
/// Keywords extracted from a suggestion description.
const SUGGESTION_KEYWORDS: usize = 3;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `naming_register` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Registered entity type.
    pub entity_type: NamingEntityType,
    /// Canonical name to register.
    pub canonical_name: String,
    /// Accepted aliases.
    pub aliases: Option<Vec<String>>,
    /// What the name refers to.
    pub description: Option<String>,
    /// Convention descriptor.
    pub convention: Option<String>,
    /// Context tags for this entry.
    pub context_tags: Option<Vec<String>>,
    /// Related registry entry ids.
    pub related_entities: Option<Vec<NamingId>>,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `naming_check` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Entity type to check against.
    pub entity_type: NamingEntityType,
    /// Name to check.
    pub proposed_name: String,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `naming_suggest` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    /// Entity type to suggest for.
    pub entity_type: NamingEntityType,
    /// Free-text description.
    pub description: String,
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

/// `naming_stats` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// Project scope; defaults to the active project.
    pub project_id: Option<ProjectId>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Registers a name, aborting on error-severity conflicts.
pub(crate) async fn register(
    router: &ToolRouter,
    context: &DispatchContext,
    request: RegisterRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let entity_type = request.entity_type;
    let canonical_name = request.canonical_name.clone();
    let select_sql = format!(
        "SELECT {NAMING_COLUMNS} FROM naming_registry \
         WHERE project_id = $1 AND entity_type = $2"
    );
    let insert_sql = format!(
        "INSERT INTO naming_registry \
         (id, project_id, entity_type, canonical_name, aliases, description, convention, \
          usage_count, deprecated, deprecated_reason, related_entity_ids, context_tags, \
          created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0, false, NULL, $8, $9, now(), now())"
    );
    let entry_id = Uuid::new_v4();
    let convention =
        request.convention.or_else(|| {
            NamingConvention::for_entity_type(entity_type).map(|c| c.label().to_string())
        });
    let insert_params = [
        SqlParam::Uuid(entry_id),
        SqlParam::Uuid(project.as_uuid()),
        SqlParam::Text(entity_type.as_str().to_string()),
        SqlParam::Text(canonical_name.clone()),
        SqlParam::TextArray(request.aliases.clone().unwrap_or_default()),
        SqlParam::OptText(request.description.clone()),
        SqlParam::OptText(convention),
        SqlParam::UuidArray(
            request
                .related_entities
                .clone()
                .unwrap_or_default()
                .iter()
                .map(|id| id.as_uuid())
                .collect(),
        ),
        SqlParam::TextArray(request.context_tags.clone().unwrap_or_default()),
    ];
    let select_params =
        [SqlParam::Uuid(project.as_uuid()), SqlParam::Text(entity_type.as_str().to_string())];
    let conflicts = router
        .gateway()
        .with_tx(&context.correlation_id, |mut tx| async move {
            let existing_rows = tx_fetch_all(&mut tx, &select_sql, &select_params).await?;
            let mut existing = Vec::with_capacity(existing_rows.len());
            for row in &existing_rows {
                existing.push(rows::naming_entry(row).map_err(|error| {
                    aidis_db::DbError::Decode(error.to_string())
                })?);
            }
            let conflicts = evaluate_conflicts(&existing, entity_type, &canonical_name);
            if conflicts.iter().any(|c| c.severity == NamingConflictSeverity::Error) {
                // Nothing inserted; the caller surfaces the conflict.
                return Ok((tx, conflicts));
            }
            tx_execute(&mut tx, &insert_sql, &insert_params).await?;
            Ok((tx, conflicts))
        })
        .await?;
    if let Some(conflict) =
        conflicts.iter().find(|c| c.severity == NamingConflictSeverity::Error)
    {
        return Err(ToolError::NamingConflict(conflict.conflict_reason.clone()));
    }
    let warnings = conflicts.iter().map(|c| c.conflict_reason.clone()).collect::<Vec<_>>();
    let row = router
        .gateway()
        .fetch_optional(
            &context.correlation_id,
            &format!("SELECT {NAMING_COLUMNS} FROM naming_registry WHERE id = $1"),
            &[SqlParam::Uuid(entry_id)],
        )
        .await?
        .ok_or_else(|| ToolError::Internal("registered entry vanished".to_string()))?;
    Ok(ToolOutput::new(serde_json::to_value(rows::naming_entry(&row)?).unwrap_or_default())
        .with_warnings(warnings))
}

/// Checks a proposed name and reports conflicts.
pub(crate) async fn check(
    router: &ToolRouter,
    context: &DispatchContext,
    request: CheckRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let existing = load_entries(router, context, project, request.entity_type).await?;
    let conflicts = evaluate_conflicts(&existing, request.entity_type, &request.proposed_name);
    Ok(ToolOutput::new(json!({
        "proposedName": request.proposed_name,
        "entityType": request.entity_type,
        "conflicts": conflicts,
    })))
}

/// Suggests convention-following names from a description.
pub(crate) async fn suggest(
    router: &ToolRouter,
    context: &DispatchContext,
    request: SuggestRequest,
) -> Result<ToolOutput, ToolError> {
    let project = router.resolve_project(context, request.project_id).await?;
    let existing = load_entries(router, context, project, request.entity_type).await?;
    let keywords = extract_keywords(&request.description, SUGGESTION_KEYWORDS);
    if keywords.is_empty() {
        return Ok(ToolOutput::new(json!({ "suggestions": [] })));
    }
    let suggestions = build_suggestions(&keywords, request.entity_type, &existing);
    Ok(ToolOutput::new(json!({ "suggestions": suggestions })))
}

/// Summarizes the naming registry for the project.
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
            "SELECT entity_type, count(*) AS total, \
             count(*) FILTER (WHERE deprecated) AS deprecated_total \
             FROM naming_registry WHERE project_id = $1 \
             GROUP BY entity_type ORDER BY total DESC",
            &[SqlParam::Uuid(project.as_uuid())],
        )
        .await?;
    let mut by_type = serde_json::Map::new();
    let mut total: i64 = 0;
    let mut deprecated: i64 = 0;
    for row in &rows {
        let label: String = sqlx::Row::try_get(row, "entity_type")
            .map_err(|error| ToolError::Internal(format!("column entity_type: {error}")))?;
        let count = count_column(row, "total");
        total += count.as_i64().unwrap_or(0);
        deprecated += count_column(row, "deprecated_total").as_i64().unwrap_or(0);
        by_type.insert(label, count);
    }
    Ok(ToolOutput::new(json!({
        "projectId": project,
        "total": total,
        "deprecated": deprecated,
        "byType": by_type,
    })))
}

// ============================================================================
// SECTION: Conflict Evaluation
// ============================================================================

/// Evaluates a proposed name against the registered entries.
pub(crate) fn evaluate_conflicts(
    existing: &[NamingEntry],
    entity_type: NamingEntityType,
    proposed: &str,
) -> Vec<NamingConflict> {
    let mut conflicts = Vec::new();
    let proposed_lower = proposed.to_lowercase();
    for entry in existing {
        if entry.canonical_name.to_lowercase() == proposed_lower {
            conflicts.push(NamingConflict {
                conflict_type: NamingConflictType::ExactMatch,
                severity: NamingConflictSeverity::Error,
                existing_entry: Some(entry.clone()),
                conflict_reason: format!(
                    "{proposed} is already registered as a {entity_type}"
                ),
                suggestion: None,
            });
            continue;
        }
        if entry.aliases.iter().any(|alias| alias.to_lowercase() == proposed_lower) {
            conflicts.push(NamingConflict {
                conflict_type: NamingConflictType::AliasConflict,
                severity: NamingConflictSeverity::Error,
                existing_entry: Some(entry.clone()),
                conflict_reason: format!(
                    "{proposed} collides with an alias of {}",
                    entry.canonical_name
                ),
                suggestion: None,
            });
            continue;
        }
        let similarity = name_similarity(&entry.canonical_name, proposed);
        if similarity >= SIMILAR_NAME_THRESHOLD {
            conflicts.push(NamingConflict {
                conflict_type: NamingConflictType::SimilarName,
                severity: NamingConflictSeverity::Warning,
                existing_entry: Some(entry.clone()),
                conflict_reason: format!(
                    "{proposed} is similar to registered name {} ({:.0}%)",
                    entry.canonical_name,
                    similarity * 100.0
                ),
                suggestion: None,
            });
        }
    }
    if let Some(convention) = NamingConvention::for_entity_type(entity_type)
        && !convention.matches(proposed)
    {
        let suggestion = convention.apply(&split_words(proposed));
        conflicts.push(NamingConflict {
            conflict_type: NamingConflictType::ConventionViolation,
            severity: NamingConflictSeverity::Warning,
            existing_entry: None,
            conflict_reason: format!(
                "{proposed} does not follow {} for {entity_type}",
                convention.label()
            ),
            suggestion: Some(suggestion),
        });
    }
    conflicts
}

// ============================================================================
// SECTION: Suggestion Building
// ============================================================================

/// Builds candidate names from keywords, registry affixes, and the
/// entity type's convention, dropping candidates that would conflict.
pub(crate) fn build_suggestions(
    keywords: &[String],
    entity_type: NamingEntityType,
    existing: &[NamingEntry],
) -> Vec<String> {
    let mut candidates: Vec<Vec<String>> = Vec::new();
    candidates.push(keywords.to_vec());
    // Reversed keyword order reads naturally for verb-last descriptions.
    if keywords.len() > 1 {
        let mut reversed = keywords.to_vec();
        reversed.reverse();
        candidates.push(reversed);
    }
    for affix in frequent_affixes(existing) {
        let mut prefixed = vec![affix.clone()];
        prefixed.extend_from_slice(keywords);
        candidates.push(prefixed);
        let mut suffixed = keywords.to_vec();
        suffixed.push(affix);
        candidates.push(suffixed);
    }
    let mut suggestions = Vec::new();
    for words in candidates {
        let rendered = render(entity_type, &words);
        if suggestions.contains(&rendered) {
            continue;
        }
        let conflicts = evaluate_conflicts(existing, entity_type, &rendered);
        if conflicts.iter().any(|c| c.severity == NamingConflictSeverity::Error) {
            continue;
        }
        suggestions.push(rendered);
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    suggestions
}

/// Renders words for the entity type, falling back to snake_case when no
/// convention is defined.
fn render(entity_type: NamingEntityType, words: &[String]) -> String {
    NamingConvention::for_entity_type(entity_type).map_or_else(
        || words.join("_"),
        |convention| convention.apply(words),
    )
}

/// Extracts the most frequent leading and trailing words from registered
/// names, most frequent first.
fn frequent_affixes(existing: &[NamingEntry]) -> Vec<String> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for entry in existing {
        let words = split_words(&entry.canonical_name);
        if let Some(first) = words.first() {
            *counts.entry(first.clone()).or_insert(0) += 1;
        }
        if words.len() > 1
            && let Some(last) = words.last()
        {
            *counts.entry(last.clone()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> =
        counts.into_iter().filter(|(_, count)| *count > 1).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(2).map(|(word, _)| word).collect()
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads every entry for `(project, entity_type)`.
async fn load_entries(
    router: &ToolRouter,
    context: &DispatchContext,
    project: ProjectId,
    entity_type: NamingEntityType,
) -> Result<Vec<NamingEntry>, ToolError> {
    let sql = format!(
        "SELECT {NAMING_COLUMNS} FROM naming_registry \
         WHERE project_id = $1 AND entity_type = $2"
    );
    let params =
        [SqlParam::Uuid(project.as_uuid()), SqlParam::Text(entity_type.as_str().to_string())];
    let result_rows = router.gateway().fetch_all(&context.correlation_id, &sql, &params).await?;
    result_rows.iter().map(rows::naming_entry).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
