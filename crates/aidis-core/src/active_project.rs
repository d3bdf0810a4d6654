// aidis-core/src/active_project.rs
// ============================================================================
// Module: Active Project Store
// Description: Per-session binding of the currently active project.
// Purpose: Supply default project ids to project-scoped tools.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The active-project map is the only mutable in-memory state of real
//! consequence: `{session id -> current project id}`, created lazily on
//! first reference and shared across request workers. Handlers receive the
//! store through the execution context rather than via process globals, so
//! tests can substitute a fresh instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::identifiers::ProjectId;
use crate::identifiers::SessionId;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Guarded map from session to its active project.
///
/// # Invariants
/// - Readers never observe a partially updated entry; every access holds the
///   guard for the full read or write.
#[derive(Debug, Clone, Default)]
pub struct ActiveProjectStore {
    /// Session to project bindings.
    inner: Arc<Mutex<HashMap<SessionId, ProjectId>>>,
}

impl ActiveProjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the guard, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, ProjectId>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Binds `session` to `project`, replacing any previous binding.
    pub fn set(&self, session: SessionId, project: ProjectId) {
        self.lock().insert(session, project);
    }

    /// Returns the active project for `session`, when bound.
    #[must_use]
    pub fn get(&self, session: SessionId) -> Option<ProjectId> {
        self.lock().get(&session).copied()
    }

    /// Removes the binding for `session`.
    pub fn clear(&self, session: SessionId) {
        self.lock().remove(&session);
    }

    /// Returns the number of tracked bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no bindings are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
