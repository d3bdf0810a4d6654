// aidis-mcp/src/tools.rs
// ============================================================================
// Module: Tool Registry and Dispatcher
// Description: Name resolution, validation, dispatch, and envelope assembly.
// Purpose: One uniform invocation path for every tool.
// Dependencies: aidis-core, aidis-contract, aidis-db, serde_json, tokio
// ============================================================================

//! ## Overview
//! The router resolves a tool name, rejects disabled tools, validates the
//! arguments against the contract schema, decodes them into the tool's
//! typed request, and runs the handler under the request deadline. Results
//! and failures are wrapped into the normalized envelopes. After a
//! successful activity-bearing call, the session tracker hook runs;
//! tracker failures are logged, never surfaced.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod agent;
pub mod context;
pub mod decision;
pub mod naming;
pub mod project;
pub mod rows;
pub mod search;
pub mod session;
pub mod system;
pub mod task;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use aidis_core::ActiveProjectStore;
use aidis_core::ApiVersion;
use aidis_core::CorrelationId;
use aidis_core::EmbeddingProvider;
use aidis_core::ErrorEnvelope;
use aidis_core::ProjectId;
use aidis_core::SessionId;
use aidis_core::ToolEnvelope;
use aidis_core::ToolError;
use aidis_core::ToolName;
use aidis_db::DbGateway;
use aidis_db::SqlParam;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

use crate::session::SessionTracker;
use crate::sse::SseService;
use crate::validation::SchemaValidator;

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// Per-request execution context threaded into every handler.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Correlation id echoed in the envelope and every log line.
    pub correlation_id: CorrelationId,
    /// Session the client identified, when any.
    pub session_id: Option<SessionId>,
    /// Authenticated principal, when any.
    pub principal: Option<String>,
    /// API version serving the request.
    pub version: ApiVersion,
}

/// Handler result: response payload plus non-fatal warnings.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Response payload.
    pub data: Value,
    /// Warnings attached to the envelope.
    pub warnings: Vec<String>,
}

impl ToolOutput {
    /// Wraps a payload with no warnings.
    #[must_use]
    pub const fn new(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    /// Attaches warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Finished dispatch: HTTP status plus the serialized envelope.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// HTTP status for the response.
    pub status: u16,
    /// Envelope body.
    pub body: Value,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Configuration inputs for building a tool router.
pub struct ToolRouterConfig {
    /// Database gateway shared by every handler.
    pub gateway: Arc<DbGateway>,
    /// Embedding provider for context storage and search.
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Session to active-project bindings.
    pub active_projects: ActiveProjectStore,
    /// Session tracker for activity hooks.
    pub tracker: Arc<SessionTracker>,
    /// SSE fan-out, surfaced by the status tool.
    pub sse: SseService,
    /// Administratively disabled tools.
    pub disabled_tools: Vec<ToolName>,
    /// Per-dispatch deadline.
    pub request_timeout: Duration,
}

/// Tool registry and dispatcher.
#[derive(Clone)]
pub struct ToolRouter {
    /// Database gateway shared by every handler.
    gateway: Arc<DbGateway>,
    /// Embedding provider for context storage and search.
    embedder: Arc<dyn EmbeddingProvider>,
    /// Session to active-project bindings.
    active_projects: ActiveProjectStore,
    /// Session tracker for activity hooks.
    tracker: Arc<SessionTracker>,
    /// SSE fan-out, surfaced by the status tool.
    sse: SseService,
    /// Compiled input validators.
    validator: Arc<SchemaValidator>,
    /// Administratively disabled tools.
    disabled_tools: Arc<Vec<ToolName>>,
    /// Per-dispatch deadline.
    request_timeout: Duration,
    /// Router construction time, for uptime reporting.
    started_at: Instant,
}

impl ToolRouter {
    /// Creates a router with compiled validators.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Internal`] when the schema catalog fails to
    /// compile.
    pub fn new(config: ToolRouterConfig) -> Result<Self, ToolError> {
        Ok(Self {
            gateway: config.gateway,
            embedder: config.embedder,
            active_projects: config.active_projects,
            tracker: config.tracker,
            sse: config.sse,
            validator: Arc::new(SchemaValidator::new()?),
            disabled_tools: Arc::new(config.disabled_tools),
            request_timeout: config.request_timeout,
            started_at: Instant::now(),
        })
    }

    /// Dispatches one tool invocation and assembles the envelope.
    pub async fn dispatch(
        &self,
        context: &DispatchContext,
        name: &str,
        arguments: &Value,
    ) -> DispatchOutcome {
        let started = Instant::now();
        let result = self.dispatch_inner(context, name, arguments).await;
        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(_) => tracing::info!(
                correlation_id = %context.correlation_id,
                tool = name,
                processing_time_ms,
                "tool dispatched"
            ),
            Err(error) => tracing::info!(
                correlation_id = %context.correlation_id,
                tool = name,
                processing_time_ms,
                code = error.code(),
                "tool dispatch failed"
            ),
        }
        match result {
            Ok(output) => {
                let envelope = ToolEnvelope::new(
                    output.data,
                    context.version,
                    context.correlation_id.as_str(),
                    processing_time_ms,
                )
                .with_warnings(output.warnings);
                DispatchOutcome {
                    status: 200,
                    body: serde_json::to_value(&envelope).unwrap_or_else(|_| json!({})),
                }
            }
            Err(error) => {
                let envelope = ErrorEnvelope::new(
                    &error,
                    context.version,
                    context.correlation_id.as_str(),
                    processing_time_ms,
                );
                DispatchOutcome {
                    status: error.http_status(),
                    body: serde_json::to_value(&envelope).unwrap_or_else(|_| json!({})),
                }
            }
        }
    }

    /// Resolution, validation, deadline, handler, and the tracker hook.
    async fn dispatch_inner(
        &self,
        context: &DispatchContext,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolOutput, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        if self.disabled_tools.contains(&tool) {
            return Err(ToolError::ToolDisabled(name.to_string()));
        }
        let arguments = self.validator.validate(tool, arguments)?;
        let output = tokio::time::timeout(self.request_timeout, self.handle(tool, context, arguments))
            .await
            .map_err(|_| {
                ToolError::Timeout(format!(
                    "{tool} exceeded its {} ms deadline",
                    self.request_timeout.as_millis()
                ))
            })??;
        if let Some(activity_type) = tool.activity_type() {
            let session = context.session_id.or_else(|| self.tracker.active_session());
            if let Some(session) = session {
                self.tracker
                    .record_activity(
                        &context.correlation_id,
                        session,
                        activity_type,
                        json!({ "tool": tool.as_str() }),
                    )
                    .await;
            }
        }
        Ok(output)
    }

    /// Routes the validated arguments to the tool's handler.
    async fn handle(
        &self,
        tool: ToolName,
        context: &DispatchContext,
        arguments: Value,
    ) -> Result<ToolOutput, ToolError> {
        match tool {
            ToolName::AidisPing => system::ping(self, context, decode(arguments)?).await,
            ToolName::AidisStatus => system::status(self, context).await,
            ToolName::AidisHelp => system::help(decode(arguments)?),
            ToolName::ContextStore => context::store(self, context, decode(arguments)?).await,
            ToolName::ContextSearch => context::search(self, context, decode(arguments)?).await,
            ToolName::ContextGetRecent => {
                context::get_recent(self, context, decode(arguments)?).await
            }
            ToolName::ContextStats => context::stats(self, context, decode(arguments)?).await,
            ToolName::ProjectCreate => project::create(self, context, decode(arguments)?).await,
            ToolName::ProjectList => project::list(self, context, decode(arguments)?).await,
            ToolName::ProjectSwitch => project::switch(self, context, decode(arguments)?).await,
            ToolName::ProjectCurrent => project::current(self, context, decode(arguments)?).await,
            ToolName::ProjectInfo => project::info(self, context, decode(arguments)?).await,
            ToolName::ProjectInsights => project::insights(self, context, decode(arguments)?).await,
            ToolName::SessionNew => session::new_session(self, context, decode(arguments)?).await,
            ToolName::SessionStatus => session::status(self, context).await,
            ToolName::SessionAssign => session::assign(self, context, decode(arguments)?).await,
            ToolName::SessionUpdate => session::update(self, context, decode(arguments)?).await,
            ToolName::NamingRegister => naming::register(self, context, decode(arguments)?).await,
            ToolName::NamingCheck => naming::check(self, context, decode(arguments)?).await,
            ToolName::NamingSuggest => naming::suggest(self, context, decode(arguments)?).await,
            ToolName::NamingStats => naming::stats(self, context, decode(arguments)?).await,
            ToolName::DecisionRecord => decision::record(self, context, decode(arguments)?).await,
            ToolName::DecisionSearch => decision::search(self, context, decode(arguments)?).await,
            ToolName::DecisionUpdate => decision::update(self, context, decode(arguments)?).await,
            ToolName::DecisionStats => decision::stats(self, context, decode(arguments)?).await,
            ToolName::TaskCreate => task::create(self, context, decode(arguments)?).await,
            ToolName::TaskList => task::list(self, context, decode(arguments)?).await,
            ToolName::TaskUpdate => task::update(self, context, decode(arguments)?).await,
            ToolName::TaskDetails => task::details(self, context, decode(arguments)?).await,
            ToolName::AgentRegister => agent::register(self, context, decode(arguments)?).await,
            ToolName::AgentList => agent::list(self, context).await,
            ToolName::AgentStatus => agent::set_status(self, context, decode(arguments)?).await,
            ToolName::AgentJoin => agent::join(self, context, decode(arguments)?).await,
            ToolName::AgentLeave => agent::leave(self, context, decode(arguments)?).await,
            ToolName::AgentSessions => agent::sessions(self, context, decode(arguments)?).await,
            ToolName::AgentMessage => agent::message(self, context, decode(arguments)?).await,
            ToolName::AgentMessages => agent::messages(self, context, decode(arguments)?).await,
            ToolName::SmartSearch => search::smart_search(self, context, decode(arguments)?).await,
            ToolName::GetRecommendations => {
                search::recommendations(self, context, decode(arguments)?).await
            }
        }
    }

    /// Returns the gateway for handlers.
    #[must_use]
    pub(crate) fn gateway(&self) -> &DbGateway {
        &self.gateway
    }

    /// Returns the embedding provider for handlers.
    #[must_use]
    pub(crate) fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// Returns the active-project store.
    #[must_use]
    pub(crate) const fn active_projects(&self) -> &ActiveProjectStore {
        &self.active_projects
    }

    /// Returns the session tracker.
    #[must_use]
    pub(crate) fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Returns the SSE fan-out service.
    #[must_use]
    pub(crate) const fn sse(&self) -> &SseService {
        &self.sse
    }

    /// Returns router uptime in seconds.
    #[must_use]
    pub(crate) fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Returns the administratively disabled tools.
    #[must_use]
    pub(crate) fn disabled_tools(&self) -> &[ToolName] {
        &self.disabled_tools
    }

    // ------------------------------------------------------------------
    // Shared resolution helpers
    // ------------------------------------------------------------------

    /// Resolves the session this request operates under, when one exists.
    #[must_use]
    pub(crate) fn current_session(&self, context: &DispatchContext) -> Option<SessionId> {
        context.session_id.or_else(|| self.tracker.active_session())
    }

    /// Resolves the session, starting and tracking a fresh one if needed.
    pub(crate) async fn ensure_session(
        &self,
        context: &DispatchContext,
    ) -> Result<SessionId, ToolError> {
        if let Some(session) = self.current_session(context) {
            return Ok(session);
        }
        let session = SessionId::new();
        self.gateway
            .execute(
                &context.correlation_id,
                "INSERT INTO sessions (id, started_at) VALUES ($1, now())",
                &[SqlParam::Uuid(session.as_uuid())],
            )
            .await?;
        self.tracker.set_active(session);
        Ok(session)
    }

    /// Resolves the project scope for a project-scoped tool.
    ///
    /// An explicit id must exist; otherwise the session's active project
    /// applies. No binding is an error per the data-model invariants.
    pub(crate) async fn resolve_project(
        &self,
        context: &DispatchContext,
        explicit: Option<ProjectId>,
    ) -> Result<ProjectId, ToolError> {
        if let Some(project) = explicit {
            let exists = self
                .gateway
                .fetch_optional(
                    &context.correlation_id,
                    "SELECT 1 AS one FROM projects WHERE id = $1",
                    &[SqlParam::Uuid(project.as_uuid())],
                )
                .await?;
            return if exists.is_some() {
                Ok(project)
            } else {
                Err(ToolError::ProjectNotFound(project.to_string()))
            };
        }
        let session = self.current_session(context).ok_or_else(|| {
            ToolError::ProjectNotFound(
                "no project specified and no active session; call project_switch first"
                    .to_string(),
            )
        })?;
        self.active_projects.get(session).ok_or_else(|| {
            ToolError::ProjectNotFound(
                "no active project for this session; call project_switch first".to_string(),
            )
        })
    }

    /// Finds a project row by id-or-name reference.
    pub(crate) async fn find_project(
        &self,
        context: &DispatchContext,
        reference: &str,
    ) -> Result<aidis_core::Project, ToolError> {
        let id = Uuid::parse_str(reference).ok();
        let row = self
            .gateway
            .fetch_optional(
                &context.correlation_id,
                "SELECT id, name, description, status, metadata, created_at, updated_at \
                 FROM projects WHERE ($1::uuid IS NOT NULL AND id = $1) OR name = $2",
                &[SqlParam::OptUuid(id), SqlParam::Text(reference.to_string())],
            )
            .await?;
        row.map(|row| rows::project(&row)).transpose()?.ok_or_else(|| {
            ToolError::ProjectNotFound(reference.to_string())
        })
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes validated arguments into a typed request payload.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidInput(err.to_string()))
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

    use std::sync::Arc;
    use std::time::Duration;

    use aidis_core::ApiVersion;
    use aidis_core::CorrelationId;
    use serde_json::json;

    use super::DispatchContext;
    use super::ToolRouter;
    use super::ToolRouterConfig;

    fn test_router(disabled: Vec<aidis_core::ToolName>) -> ToolRouter {
        let config = aidis_config::AidisConfig::from_lookup(|_| None).expect("config");
        let gateway =
            Arc::new(aidis_db::DbGateway::connect_lazy(&config.database).expect("gateway"));
        ToolRouter::new(ToolRouterConfig {
            gateway: Arc::clone(&gateway),
            embedder: Arc::new(aidis_core::HashEmbeddingProvider::new(64)),
            active_projects: aidis_core::ActiveProjectStore::new(),
            tracker: Arc::new(crate::session::SessionTracker::new(gateway)),
            sse: crate::sse::SseService::new(config.sse),
            disabled_tools: disabled,
            request_timeout: Duration::from_secs(5),
        })
        .expect("router")
    }

    fn test_context() -> DispatchContext {
        DispatchContext {
            correlation_id: CorrelationId::new("req-test"),
            session_id: None,
            principal: None,
            version: ApiVersion::V2,
        }
    }

    #[tokio::test]
    async fn unknown_tools_return_404_envelopes() {
        let router = test_router(Vec::new());
        let outcome = router.dispatch(&test_context(), "no_such_tool", &json!({})).await;
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.body["success"], json!(false));
        assert_eq!(outcome.body["code"], json!("ToolNotFound"));
        assert_eq!(outcome.body["requestId"], json!("req-test"));
    }

    #[tokio::test]
    async fn disabled_tools_return_404_with_their_own_code() {
        let router = test_router(vec![aidis_core::ToolName::SmartSearch]);
        let outcome = router
            .dispatch(&test_context(), "smart_search", &json!({"query": "x"}))
            .await;
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.body["code"], json!("ToolDisabled"));
    }

    #[tokio::test]
    async fn validation_failures_return_400_and_name_the_field() {
        let router = test_router(Vec::new());
        let outcome = router.dispatch(&test_context(), "context_store", &json!({})).await;
        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body["code"], json!("InvalidInput"));
        let message = outcome.body["error"].as_str().expect("message");
        assert!(message.contains("type") || message.contains("content"), "{message}");
    }

    #[tokio::test]
    async fn successful_dispatch_echoes_the_correlation_id() {
        let router = test_router(Vec::new());
        let outcome = router
            .dispatch(&test_context(), "aidis_ping", &json!({"message": "hello"}))
            .await;
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.body["success"], json!(true));
        assert_eq!(outcome.body["requestId"], json!("req-test"));
        assert_eq!(outcome.body["version"], json!("v2"));
        assert!(outcome.body["processingTimeMs"].is_u64());
        assert_eq!(outcome.body["data"]["message"], json!("hello"));
    }

    #[tokio::test]
    async fn help_lists_the_full_catalog() {
        let router = test_router(Vec::new());
        let outcome = router.dispatch(&test_context(), "aidis_help", &json!({})).await;
        assert_eq!(outcome.status, 200);
        let tools = outcome.body["data"]["tools"].as_array().expect("tools");
        assert_eq!(tools.len(), aidis_core::ToolName::all().len());
    }
}
