// aidis-contract/src/lib.rs
// ============================================================================
// Module: AIDIS Contract Library
// Description: External tool contract for the AIDIS dispatcher.
// Purpose: One canonical source for tool descriptors and input schemas.
// Dependencies: aidis-core, serde_json
// ============================================================================

//! ## Overview
//! The contract crate describes every tool the dispatcher exposes: its
//! name, description, endpoint path, and JSON input schema. The HTTP
//! listing endpoints serialize these descriptors verbatim, and the
//! validation layer compiles the same schemas, so clients and the server
//! can never disagree about a tool's shape.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod schemas;
pub mod tooling;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aidis_core::ToolCategory;
pub use aidis_core::ToolName;
pub use schemas::input_schema;
pub use tooling::ToolDefinition;
pub use tooling::endpoint_path;
pub use tooling::tool_definition;
pub use tooling::tool_definitions;
pub use tooling::tool_description;
