// aidis-core/src/error.rs
// ============================================================================
// Module: Error Taxonomy
// Description: Typed tool errors and their HTTP surface mapping.
// Purpose: One error vocabulary spanning dispatch, handlers, and transport.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Handlers return [`ToolError`] values; the dispatcher maps each kind onto a
//! stable code label and an HTTP status. Responses never carry stack traces,
//! only the error message and code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Tool Errors
// ============================================================================

/// Typed failure returned by tool handlers and the dispatcher.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Input failed schema validation.
    #[error("{0}")]
    InvalidInput(String),
    /// Tool name is not in the registry.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),
    /// Tool exists but is administratively disabled.
    #[error("tool disabled: {0}")]
    ToolDisabled(String),
    /// Wrong HTTP method for a tool endpoint.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    /// Referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    /// Referenced session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),
    /// Referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(String),
    /// Referenced decision does not exist.
    #[error("decision not found: {0}")]
    DecisionNotFound(String),
    /// Referenced agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    /// Hard naming registry conflict.
    #[error("naming conflict: {0}")]
    NamingConflict(String),
    /// Uniqueness violation.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Request or database call exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Database gateway circuit breaker is open.
    #[error("database circuit breaker is open")]
    CircuitOpen,
    /// Embedding provider failed or is unreachable.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Returns the stable error code carried in response envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::ToolDisabled(_) => "ToolDisabled",
            Self::MethodNotAllowed(_) => "MethodNotAllowed",
            Self::ProjectNotFound(_) => "ProjectNotFound",
            Self::SessionNotFound(_) => "SessionNotFound",
            Self::TaskNotFound(_) => "TaskNotFound",
            Self::DecisionNotFound(_) => "DecisionNotFound",
            Self::AgentNotFound(_) => "AgentNotFound",
            Self::NamingConflict(_) => "NamingConflict",
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::Timeout(_) => "Timeout",
            Self::CircuitOpen => "CircuitOpen",
            Self::EmbeddingUnavailable(_) => "EmbeddingUnavailable",
            Self::Internal(_) => "Internal",
        }
    }

    /// Returns the HTTP status the dispatcher surfaces for this kind.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::ToolNotFound(_)
            | Self::ToolDisabled(_)
            | Self::ProjectNotFound(_)
            | Self::SessionNotFound(_)
            | Self::TaskNotFound(_)
            | Self::DecisionNotFound(_)
            | Self::AgentNotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::NamingConflict(_) | Self::AlreadyExists(_) => 409,
            Self::CircuitOpen | Self::EmbeddingUnavailable(_) => 503,
            Self::Timeout(_) => 504,
            Self::Internal(_) => 500,
        }
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

    use super::ToolError;

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        assert_eq!(ToolError::InvalidInput("bad".into()).http_status(), 400);
        assert_eq!(ToolError::ToolNotFound("x".into()).http_status(), 404);
        assert_eq!(ToolError::ToolDisabled("x".into()).http_status(), 404);
        assert_eq!(ToolError::MethodNotAllowed("GET".into()).http_status(), 405);
        assert_eq!(ToolError::NamingConflict("dup".into()).http_status(), 409);
        assert_eq!(ToolError::AlreadyExists("dup".into()).http_status(), 409);
        assert_eq!(ToolError::CircuitOpen.http_status(), 503);
        assert_eq!(ToolError::EmbeddingUnavailable("down".into()).http_status(), 503);
        assert_eq!(ToolError::Timeout("30s".into()).http_status(), 504);
        assert_eq!(ToolError::Internal("boom".into()).http_status(), 500);
    }

    #[test]
    fn codes_are_stable_labels() {
        assert_eq!(ToolError::CircuitOpen.code(), "CircuitOpen");
        assert_eq!(ToolError::NamingConflict("dup".into()).code(), "NamingConflict");
    }
}
