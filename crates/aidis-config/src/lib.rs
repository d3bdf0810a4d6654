// aidis-config/src/lib.rs
// ============================================================================
// Module: AIDIS Configuration Library
// Description: Environment-driven configuration for the AIDIS server.
// Purpose: Strict, fail-closed config parsing with named defaults.
// Dependencies: aidis-core, thiserror
// ============================================================================

//! ## Overview
//! All AIDIS configuration comes from environment variables. Parsing is
//! fail-closed: a malformed value is an error, never a silent fallback.
//! Every limit and default is a named constant so operational tuning has a
//! single place to look.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AidisConfig;
pub use config::ConfigError;
pub use config::DatabaseConfig;
pub use config::EmbeddingConfig;
pub use config::HttpConfig;
pub use config::LifecycleConfig;
pub use config::ListenerConfig;
pub use config::LogLevel;
pub use config::SseConfig;
