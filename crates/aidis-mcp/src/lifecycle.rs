// aidis-mcp/src/lifecycle.rs
// ============================================================================
// Module: Lifecycle Manager
// Description: Startup ordering and signal-driven graceful shutdown.
// Purpose: Bring the server up safely and take it down inside the budget.
// Dependencies: aidis-config, aidis-core, aidis-db, axum, tokio
// ============================================================================

//! ## Overview
//! Startup order: singleton, database (with its retry budget), HTTP
//! listen, DB events listen. Shutdown on SIGINT/SIGTERM: stop accepting
//! requests, send the SSE shutdown event, stop the listener, close the
//! pool, remove the PID file. Cleanup is bounded by the shutdown budget;
//! in-flight dispatches are bounded by their own deadlines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use aidis_config::AidisConfig;
use aidis_core::ActiveProjectStore;
use aidis_core::EmbeddingProvider;
use aidis_core::HashEmbeddingProvider;
use aidis_core::HttpEmbeddingProvider;
use aidis_db::DbEventsListener;
use aidis_db::DbGateway;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::server::AppState;
use crate::server::build_router;
use crate::session::SessionTracker;
use crate::singleton::PidFile;
use crate::singleton::SingletonError;
use crate::sse::SseService;
use crate::tools::ToolRouter;
use crate::tools::ToolRouterConfig;

/// Buffer between the listener and the SSE forwarder.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Another instance is running, or the PID file is unusable.
    #[error(transparent)]
    Singleton(#[from] SingletonError),
    /// Database could not be opened within the retry budget.
    #[error("database init failed: {0}")]
    Database(String),
    /// Component initialization failed.
    #[error("init failed: {0}")]
    Init(String),
    /// HTTP transport failed.
    #[error("transport failed: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Runs the server until a termination signal arrives.
///
/// # Errors
///
/// Returns [`ServerError`] when startup fails; a clean signal-driven
/// shutdown returns `Ok`.
pub async fn run(config: AidisConfig) -> Result<(), ServerError> {
    let mut pid_file = PidFile::acquire(&config.lifecycle.pid_file)?;
    let gateway = Arc::new(
        DbGateway::connect(&config.database)
            .await
            .map_err(|error| ServerError::Database(error.to_string()))?,
    );
    let embedder = build_embedder(&config)?;
    let sse = SseService::new(config.sse.clone());
    let tracker = Arc::new(SessionTracker::new(Arc::clone(&gateway)));
    let router = ToolRouter::new(ToolRouterConfig {
        gateway: Arc::clone(&gateway),
        embedder,
        active_projects: ActiveProjectStore::new(),
        tracker,
        sse: sse.clone(),
        disabled_tools: config.disabled_tools.clone(),
        request_timeout: config.http.request_timeout,
    })
    .map_err(|error| ServerError::Init(error.to_string()))?;

    let app = build_router(
        AppState {
            router,
            sse: sse.clone(),
            gateway: Arc::clone(&gateway),
        },
        &config.http,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http.port));
    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|error| ServerError::Transport(format!("bind {addr}: {error}")))?;
    tracing::info!(%addr, "http listener bound");

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let forwarder = tokio::spawn(sse.clone().run_forwarder(events_rx));
    let listener =
        DbEventsListener::spawn(config.database.url.clone(), config.listener.clone(), events_tx);

    let serve_result = axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| ServerError::Transport(error.to_string()));

    tracing::info!("shutting down");
    let cleanup = async {
        sse.disconnect_all();
        listener.stop().await;
        forwarder.abort();
        gateway.close().await;
    };
    if tokio::time::timeout(config.lifecycle.shutdown_budget, cleanup).await.is_err() {
        tracing::warn!("shutdown budget exceeded; exiting with pending cleanup");
    }
    pid_file.release();
    serve_result
}

/// Builds the configured embedding provider.
fn build_embedder(config: &AidisConfig) -> Result<Arc<dyn EmbeddingProvider>, ServerError> {
    match &config.embedding.endpoint {
        Some(endpoint) => {
            let provider = HttpEmbeddingProvider::new(
                endpoint.clone(),
                config.embedding.dimensions,
                config.embedding.request_timeout,
            )
            .map_err(|error| ServerError::Init(error.to_string()))?;
            Ok(Arc::new(provider))
        }
        None => Ok(Arc::new(HashEmbeddingProvider::new(config.embedding.dimensions))),
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(error = %error, "sigterm handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("termination signal received");
}
