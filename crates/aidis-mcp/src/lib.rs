// aidis-mcp/src/lib.rs
// ============================================================================
// Module: AIDIS MCP Library
// Description: The tool-dispatch HTTP service and its event fan-out.
// Purpose: Expose the server building blocks and the run entry point.
// Dependencies: aidis-core, aidis-contract, aidis-config, aidis-db, axum
// ============================================================================

//! ## Overview
//! This crate is the server: the HTTP surface, input validation, the tool
//! registry and dispatcher, the tool handlers, the SSE fan-out, the
//! session tracker, the process singleton, and the lifecycle manager.
//! `lifecycle::run` wires them together in startup order and tears them
//! down on a termination signal.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod lifecycle;
pub mod server;
pub mod session;
pub mod singleton;
pub mod sse;
pub mod tools;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lifecycle::ServerError;
pub use lifecycle::run;
pub use server::AppState;
pub use server::build_router;
pub use session::SessionTracker;
pub use singleton::PidFile;
pub use singleton::SingletonError;
pub use sse::SseService;
pub use sse::SseStats;
pub use sse::SubscriberFilter;
pub use tools::DispatchContext;
pub use tools::DispatchOutcome;
pub use tools::ToolRouter;
pub use tools::ToolRouterConfig;
pub use validation::SchemaValidator;
