// aidis-db/src/listener.rs
// ============================================================================
// Module: DB Events Listener
// Description: Persistent LISTEN on the aidis_changes NOTIFY channel.
// Purpose: Convert database change notifications into in-process events.
// Dependencies: aidis-core, aidis-config, sqlx, tokio, tracing
// ============================================================================

//! ## Overview
//! The listener holds a dedicated connection, separate from the gateway
//! pool, and forwards parsed notifications to the SSE fan-out. Connection
//! loss schedules a reconnect with exponential backoff capped at the
//! configured ceiling, indefinitely while the process is not shutting
//! down. Invalid payloads are logged and dropped; the listener never
//! surfaces errors to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use aidis_config::ListenerConfig;
use aidis_core::ChangeEvent;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Observable listener status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStatus {
    /// True while the LISTEN connection is established.
    pub connected: bool,
    /// Reconnect attempts since the last successful connect.
    pub reconnect_attempts: u32,
}

/// Shared counters backing [`ListenerStatus`].
#[derive(Debug, Default)]
struct StatusCells {
    /// True while connected.
    connected: AtomicBool,
    /// Reconnect attempts since the last successful connect.
    reconnect_attempts: AtomicU32,
}

// ============================================================================
// SECTION: Listener
// ============================================================================

/// Background LISTEN task with reconnect and shutdown control.
pub struct DbEventsListener {
    /// Shutdown signal; true means stop.
    shutdown: watch::Sender<bool>,
    /// Shared status counters.
    status: Arc<StatusCells>,
    /// Background task handle, taken on stop.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DbEventsListener {
    /// Spawns the listener task.
    ///
    /// Parsed events are forwarded to `events`; the task ends when the
    /// receiver is dropped or [`Self::stop`] is called.
    #[must_use]
    pub fn spawn(
        database_url: String,
        config: ListenerConfig,
        events: mpsc::Sender<ChangeEvent>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let status = Arc::new(StatusCells::default());
        let task_status = Arc::clone(&status);
        let handle =
            tokio::spawn(run_listener(database_url, config, events, shutdown_rx, task_status));
        Self {
            shutdown,
            status,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Returns the current connection status.
    #[must_use]
    pub fn status(&self) -> ListenerStatus {
        ListenerStatus {
            connected: self.status.connected.load(Ordering::Acquire),
            reconnect_attempts: self.status.reconnect_attempts.load(Ordering::Acquire),
        }
    }

    /// Stops the listener: cancels any pending reconnect timer and closes
    /// the connection. Idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = {
            let mut guard = match self.handle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

// ============================================================================
// SECTION: Task Body
// ============================================================================

/// Connect/listen/reconnect loop.
async fn run_listener(
    database_url: String,
    config: ListenerConfig,
    events: mpsc::Sender<ChangeEvent>,
    mut shutdown: watch::Receiver<bool>,
    status: Arc<StatusCells>,
) {
    let mut attempt: u32 = 0;
    loop {
        if *shutdown.borrow() {
            break;
        }
        match connect(&database_url, &config.channel).await {
            Ok(listener) => {
                status.connected.store(true, Ordering::Release);
                status.reconnect_attempts.store(0, Ordering::Release);
                attempt = 0;
                tracing::info!(channel = %config.channel, "db events listener connected");
                let lost = pump(listener, &events, &mut shutdown).await;
                status.connected.store(false, Ordering::Release);
                if !lost {
                    break;
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "db events listener connect failed");
            }
        }
        if *shutdown.borrow() {
            break;
        }
        attempt = attempt.saturating_add(1);
        status.reconnect_attempts.store(attempt, Ordering::Release);
        let delay = reconnect_delay(config.backoff_base, config.backoff_cap, attempt);
        tracing::info!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "db events listener reconnect scheduled");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {}
        }
    }
    tracing::info!("db events listener stopped");
}

/// Opens the dedicated LISTEN connection.
async fn connect(database_url: &str, channel: &str) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect(database_url).await?;
    listener.listen(channel).await?;
    Ok(listener)
}

/// Receives notifications until the connection drops or shutdown.
///
/// Returns true when the connection was lost and a reconnect should be
/// scheduled, false on orderly shutdown.
async fn pump(
    mut listener: PgListener,
    events: &mpsc::Sender<ChangeEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return false;
                }
            }
            notification = listener.try_recv() => {
                match notification {
                    Ok(Some(notification)) => {
                        let Some(event) = parse_payload(notification.payload()) else {
                            continue;
                        };
                        if events.send(event).await.is_err() {
                            // Fan-out is gone; nothing left to deliver to.
                            return false;
                        }
                    }
                    Ok(None) => {
                        tracing::warn!("db events connection lost");
                        return true;
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "db events receive failed");
                        return true;
                    }
                }
            }
        }
    }
}

/// Parses one NOTIFY payload; invalid JSON is logged and dropped.
fn parse_payload(payload: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<ChangeEvent>(payload) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::warn!(error = %error, "dropping invalid change notification");
            None
        }
    }
}

/// Computes the reconnect delay for `attempt` (1-based), capped.
#[must_use]
pub fn reconnect_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(2_u32.saturating_pow(exponent)).min(cap)
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

    use std::time::Duration;

    use aidis_core::ChangeAction;
    use aidis_core::EntityKind;

    use super::parse_payload;
    use super::reconnect_delay;

    #[test]
    fn reconnect_backoff_progresses_and_caps() {
        let base = Duration::from_secs(2);
        let cap = Duration::from_secs(30);
        assert_eq!(reconnect_delay(base, cap, 1), Duration::from_secs(2));
        assert_eq!(reconnect_delay(base, cap, 2), Duration::from_secs(4));
        assert_eq!(reconnect_delay(base, cap, 3), Duration::from_secs(8));
        assert_eq!(reconnect_delay(base, cap, 4), Duration::from_secs(16));
        assert_eq!(reconnect_delay(base, cap, 5), Duration::from_secs(30));
        assert_eq!(reconnect_delay(base, cap, 12), Duration::from_secs(30));
    }

    #[test]
    fn valid_payloads_parse() {
        let event = parse_payload(
            r#"{"entity":"contexts","action":"insert","id":"c1","at":"2025-05-04T12:00:00Z"}"#,
        )
        .expect("event");
        assert_eq!(event.entity, EntityKind::Contexts);
        assert_eq!(event.action, ChangeAction::Insert);
    }

    #[test]
    fn invalid_payloads_are_dropped() {
        assert!(parse_payload("not json").is_none());
        assert!(parse_payload(r#"{"entity":"unknown","action":"insert","id":"x","at":"2025-05-04T12:00:00Z"}"#).is_none());
    }
}
