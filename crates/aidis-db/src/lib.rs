// aidis-db/src/lib.rs
// ============================================================================
// Module: AIDIS Database Library
// Description: Pooled Postgres access and the NOTIFY change listener.
// Purpose: One gateway for every query; one dedicated LISTEN connection.
// Dependencies: aidis-core, aidis-config, sqlx, tokio, tracing
// ============================================================================

//! ## Overview
//! The gateway is the only path to the database: it owns the pool, the
//! retry policy, and the circuit breaker, so every caller gets uniform
//! transient-failure handling. The events listener holds a separate,
//! exclusive connection for `LISTEN aidis_changes` and reconnects with
//! capped exponential backoff for as long as the process is running.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod breaker;
pub mod gateway;
pub mod listener;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use breaker::BreakerSnapshot;
pub use breaker::BreakerState;
pub use breaker::CircuitBreaker;
pub use gateway::DbError;
pub use gateway::DbGateway;
pub use gateway::SqlParam;
pub use listener::DbEventsListener;
pub use listener::ListenerStatus;
