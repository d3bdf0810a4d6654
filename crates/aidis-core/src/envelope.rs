// aidis-core/src/envelope.rs
// ============================================================================
// Module: Response Envelopes
// Description: Normalized success and failure response shapes.
// Purpose: One envelope contract across every tool and API version.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool invocation returns one of two envelopes. Success carries the
//! handler's data plus request metadata; failure carries the error message
//! and its stable code. Field names are camelCase on the wire to match the
//! consuming UI.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

// ============================================================================
// SECTION: API Versions
// ============================================================================

/// API surface version reported in envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy compatibility alias.
    V1,
    /// Current versioned surface.
    V2,
}

impl ApiVersion {
    /// Returns the stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    /// Comma-separated list of supported versions, for the header contract.
    #[must_use]
    pub const fn supported() -> &'static str {
        "v1,v2"
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Successful tool response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEnvelope {
    /// Always `true`.
    pub success: bool,
    /// Handler result payload.
    pub data: Value,
    /// API version that served the request.
    pub version: ApiVersion,
    /// Correlation identifier for the request.
    pub request_id: String,
    /// Wall-clock dispatch duration in milliseconds.
    pub processing_time_ms: u64,
    /// Non-fatal warnings attached by the handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ToolEnvelope {
    /// Builds a success envelope.
    #[must_use]
    pub fn new(
        data: Value,
        version: ApiVersion,
        request_id: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            data,
            version,
            request_id: request_id.into(),
            processing_time_ms,
            warnings: None,
        }
    }

    /// Attaches warnings when any are present.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        if !warnings.is_empty() {
            self.warnings = Some(warnings);
        }
        self
    }
}

/// Failed tool response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
    /// Stable error code from the taxonomy.
    pub code: String,
    /// API version that served the request.
    pub version: ApiVersion,
    /// Correlation identifier for the request.
    pub request_id: String,
    /// Wall-clock dispatch duration in milliseconds.
    pub processing_time_ms: u64,
}

impl ErrorEnvelope {
    /// Builds a failure envelope from a typed error.
    #[must_use]
    pub fn new(
        error: &ToolError,
        version: ApiVersion,
        request_id: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            code: error.code().to_string(),
            version,
            request_id: request_id.into(),
            processing_time_ms,
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

    use serde_json::json;

    use super::ApiVersion;
    use super::ErrorEnvelope;
    use super::ToolEnvelope;
    use crate::error::ToolError;

    #[test]
    fn success_envelope_uses_camel_case_wire_fields() {
        let envelope = ToolEnvelope::new(json!({"id": 1}), ApiVersion::V2, "req-1", 12);
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["requestId"], json!("req-1"));
        assert_eq!(value["processingTimeMs"], json!(12));
        assert_eq!(value["version"], json!("v2"));
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn empty_warning_lists_are_omitted() {
        let envelope =
            ToolEnvelope::new(json!(null), ApiVersion::V1, "req-2", 1).with_warnings(Vec::new());
        assert!(envelope.warnings.is_none());
    }

    #[test]
    fn error_envelope_carries_code_and_message() {
        let error = ToolError::ProjectNotFound("alpha".into());
        let envelope = ErrorEnvelope::new(&error, ApiVersion::V2, "req-3", 4);
        assert!(!envelope.success);
        assert_eq!(envelope.code, "ProjectNotFound");
        assert!(envelope.error.contains("alpha"));
    }
}
