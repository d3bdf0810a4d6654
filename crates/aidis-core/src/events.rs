// aidis-core/src/events.rs
// ============================================================================
// Module: Change Events
// Description: Database change notifications fanned out to UI clients.
// Purpose: Shared payload shapes for the NOTIFY listener and SSE service.
// Dependencies: serde, chrono
// ============================================================================

//! ## Overview
//! Database triggers publish JSON payloads on a single NOTIFY channel; the
//! listener parses them into [`ChangeEvent`] values and the SSE service fans
//! them out. Entity kinds form a closed registry: subscriber filters naming
//! an unknown kind are rejected at subscribe time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ProjectId;

// ============================================================================
// SECTION: Entity Kinds
// ============================================================================

/// Entity kinds that can appear in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Project rows.
    Projects,
    /// Session rows.
    Sessions,
    /// Context rows.
    Contexts,
    /// Decision rows.
    Decisions,
    /// Task rows.
    Tasks,
    /// Agent rows.
    Agents,
    /// Agent message rows.
    AgentMessages,
    /// Naming registry rows.
    NamingEntries,
    /// Code component rows produced by external analysis pipelines.
    CodeComponents,
}

impl EntityKind {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Sessions => "sessions",
            Self::Contexts => "contexts",
            Self::Decisions => "decisions",
            Self::Tasks => "tasks",
            Self::Agents => "agents",
            Self::AgentMessages => "agent_messages",
            Self::NamingEntries => "naming_entries",
            Self::CodeComponents => "code_components",
        }
    }

    /// Parses an entity kind from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "projects" => Some(Self::Projects),
            "sessions" => Some(Self::Sessions),
            "contexts" => Some(Self::Contexts),
            "decisions" => Some(Self::Decisions),
            "tasks" => Some(Self::Tasks),
            "agents" => Some(Self::Agents),
            "agent_messages" => Some(Self::AgentMessages),
            "naming_entries" => Some(Self::NamingEntries),
            "code_components" => Some(Self::CodeComponents),
            _ => None,
        }
    }

    /// Returns all entity kinds in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Projects,
            Self::Sessions,
            Self::Contexts,
            Self::Decisions,
            Self::Tasks,
            Self::Agents,
            Self::AgentMessages,
            Self::NamingEntries,
            Self::CodeComponents,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Change Events
// ============================================================================

/// Row-level change action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Row inserted.
    Insert,
    /// Row updated.
    Update,
    /// Row deleted.
    Delete,
}

impl ChangeAction {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed NOTIFY payload describing one row change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Entity kind the change applies to.
    pub entity: EntityKind,
    /// Change action.
    pub action: ChangeAction,
    /// Changed row identifier, as published by the trigger.
    pub id: String,
    /// Owning project, when the entity is project-scoped.
    #[serde(rename = "projectId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Change timestamp published by the trigger.
    pub at: DateTime<Utc>,
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

    use super::ChangeEvent;
    use super::EntityKind;

    #[test]
    fn entity_kinds_round_trip() {
        for kind in EntityKind::all() {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(*kind));
        }
        assert!(EntityKind::parse("invalid").is_none());
    }

    #[test]
    fn change_event_parses_trigger_payload() {
        let payload = r#"{
            "entity": "tasks",
            "action": "update",
            "id": "t1",
            "projectId": "7f1d0a4e-46ab-41d6-9a62-18a904c2a4b1",
            "at": "2025-05-04T12:00:00Z"
        }"#;
        let event: ChangeEvent = serde_json::from_str(payload).expect("parse");
        assert_eq!(event.entity, EntityKind::Tasks);
        assert_eq!(event.id, "t1");
        assert!(event.project_id.is_some());
    }

    #[test]
    fn change_event_tolerates_missing_project() {
        let payload = r#"{"entity":"agents","action":"insert","id":"a1","at":"2025-05-04T12:00:00Z"}"#;
        let event: ChangeEvent = serde_json::from_str(payload).expect("parse");
        assert!(event.project_id.is_none());
    }
}
