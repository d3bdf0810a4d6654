// aidis-mcp/src/sse.rs
// ============================================================================
// Module: SSE Fan-out Service
// Description: Per-client change-event streams with filtering and heartbeats.
// Purpose: Deliver database change events to UI clients in real time.
// Dependencies: aidis-core, aidis-config, axum, tokio, tokio-stream
// ============================================================================

//! ## Overview
//! The service keeps one subscriber entry per open connection. Broadcast
//! iterates a snapshot of the table so concurrent subscribe/unsubscribe
//! never block delivery, and every write is a non-blocking channel send: a
//! full or closed channel removes that one subscriber and never affects
//! the others. Event ids come from a process-lifetime counter, so each
//! subscriber observes strictly increasing ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;
use std::time::Instant;

use aidis_config::SseConfig;
use aidis_core::ChangeEvent;
use aidis_core::EntityKind;
use aidis_core::ProjectId;
use axum::response::sse::Event;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

/// Per-subscriber channel capacity before a write counts as failed.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Subscribe-time failures.
#[derive(Debug, Error)]
pub enum SseError {
    /// The per-user connection cap is exhausted.
    #[error("too many concurrent event streams for user {0}")]
    TooManyConnections(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Filters requested by one subscriber.
#[derive(Debug, Clone, Default)]
pub struct SubscriberFilter {
    /// Only events for this project; events without a project bypass.
    pub project_id: Option<ProjectId>,
    /// Only events whose entity is in this set.
    pub entities: Option<Vec<EntityKind>>,
}

impl SubscriberFilter {
    /// Returns true when `event` passes this filter.
    #[must_use]
    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        if let Some(entities) = &self.entities
            && !entities.contains(&event.entity)
        {
            return false;
        }
        if let Some(project) = self.project_id
            && let Some(event_project) = event.project_id
            && event_project != project
        {
            return false;
        }
        true
    }
}

/// One subscriber table entry.
struct Subscriber {
    /// Authenticated user the stream belongs to.
    user_id: String,
    /// Requested filters.
    filter: SubscriberFilter,
    /// Wall-clock connect time, for the redacted client listing.
    connected_at: DateTime<Utc>,
    /// Monotonic connect time, for duration accounting.
    connected_instant: Instant,
    /// Outbound frame channel.
    sender: mpsc::Sender<Event>,
    /// Heartbeat task handle.
    heartbeat: JoinHandle<()>,
}

/// Observable fan-out statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SseStats {
    /// Open connections.
    pub total_connections: usize,
    /// Open connections per user.
    pub connections_by_user: HashMap<String, usize>,
    /// Service uptime in seconds.
    pub uptime_seconds: u64,
    /// Next event id to be assigned.
    pub next_event_id: u64,
}

/// Redacted per-client listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SseClientInfo {
    /// Authenticated user.
    pub user_id: String,
    /// Project filter, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Entity filter, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityKind>>,
    /// Connect timestamp.
    pub connected_at: DateTime<Utc>,
    /// Connection age in milliseconds.
    pub connection_duration_ms: u64,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Shared fan-out state.
struct SseInner {
    /// Fan-out configuration.
    config: SseConfig,
    /// Subscriber table keyed by subscription id.
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    /// Next subscription id.
    next_subscriber_id: AtomicU64,
    /// Next event id; process-lifetime, strictly increasing.
    next_event_id: AtomicU64,
    /// Service start time.
    started_at: Instant,
}

/// SSE fan-out service handle.
#[derive(Clone)]
pub struct SseService {
    /// Shared state.
    inner: Arc<SseInner>,
}

impl SseService {
    /// Creates an empty fan-out service.
    #[must_use]
    pub fn new(config: SseConfig) -> Self {
        Self {
            inner: Arc::new(SseInner {
                config,
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(1),
                next_event_id: AtomicU64::new(1),
                started_at: Instant::now(),
            }),
        }
    }

    /// Acquires the table guard, recovering from poisoning.
    fn table(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Registers a subscriber and returns its frame stream.
    ///
    /// The returned stream already carries the retry hint and the
    /// `connected` system event. Dropping it removes the subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`SseError::TooManyConnections`] when the user is at the
    /// configured cap.
    pub fn subscribe(
        &self,
        user_id: impl Into<String>,
        filter: SubscriberFilter,
    ) -> Result<SseSubscription, SseError> {
        let user_id = user_id.into();
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut table = self.table();
            let open = table.values().filter(|entry| entry.user_id == user_id).count();
            if open >= self.inner.config.max_connections_per_user {
                return Err(SseError::TooManyConnections(user_id));
            }
            let heartbeat = self.spawn_heartbeat(id, sender.clone());
            table.insert(id, Subscriber {
                user_id: user_id.clone(),
                filter,
                connected_at: Utc::now(),
                connected_instant: Instant::now(),
                sender: sender.clone(),
                heartbeat,
            });
        }
        let retry = Event::default().retry(Duration::from_millis(self.inner.config.retry_hint_ms));
        let connected = Event::default()
            .event("connected")
            .data(json!({ "userId": user_id.as_str() }).to_string());
        // The channel is fresh; capacity covers both greeting frames.
        let _ = sender.try_send(retry);
        let _ = sender.try_send(connected);
        tracing::debug!(subscriber = id, user_id = %user_id, "sse subscriber connected");
        Ok(SseSubscription {
            service: self.clone(),
            id,
            frames: ReceiverStream::new(receiver),
        })
    }

    /// Spawns the per-connection heartbeat task.
    fn spawn_heartbeat(&self, id: u64, sender: mpsc::Sender<Event>) -> JoinHandle<()> {
        let service = self.clone();
        let interval = self.inner.config.heartbeat_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let keep_alive = Event::default().comment("keep-alive");
                if sender.try_send(keep_alive).is_err() {
                    service.remove(id, "failed_heartbeat");
                    break;
                }
            }
        })
    }

    /// Fans one change event out to every matching subscriber.
    pub fn broadcast(&self, event: &ChangeEvent) {
        let event_id = self.inner.next_event_id.fetch_add(1, Ordering::Relaxed);
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(error = %error, "change event serialization failed");
                return;
            }
        };
        // Snapshot so broadcast never blocks subscribe/unsubscribe.
        let targets: Vec<(u64, String, mpsc::Sender<Event>)> = {
            let table = self.table();
            table
                .iter()
                .filter(|(_, entry)| entry.filter.accepts(event))
                .map(|(id, entry)| (*id, entry.user_id.clone(), entry.sender.clone()))
                .collect()
        };
        for (id, user_id, sender) in targets {
            let frame = Event::default()
                .id(event_id.to_string())
                .event(event.entity.as_str())
                .data(payload.clone());
            if sender.try_send(frame).is_err() {
                tracing::warn!(
                    subscriber = id,
                    user_id = %user_id,
                    event = %event.entity,
                    "failed_write; removing sse subscriber"
                );
                self.remove(id, "failed_write");
            }
        }
    }

    /// Removes one subscriber and cancels its heartbeat.
    fn remove(&self, id: u64, reason: &str) {
        let removed = {
            let mut table = self.table();
            table.remove(&id)
        };
        if let Some(entry) = removed {
            entry.heartbeat.abort();
            tracing::debug!(subscriber = id, user_id = %entry.user_id, reason, "sse subscriber removed");
        }
    }

    /// Sends the shutdown system event to everyone and clears the table.
    pub fn disconnect_all(&self) {
        let drained: Vec<Subscriber> = {
            let mut table = self.table();
            table.drain().map(|(_, entry)| entry).collect()
        };
        for entry in drained {
            let frame = Event::default()
                .event("system")
                .data(json!({ "message": "server-shutdown" }).to_string());
            let _ = entry.sender.try_send(frame);
            entry.heartbeat.abort();
            // Dropping the sender ends the client's stream.
        }
        tracing::info!("sse subscribers disconnected for shutdown");
    }

    /// Returns observable statistics.
    #[must_use]
    pub fn get_stats(&self) -> SseStats {
        let table = self.table();
        let mut connections_by_user: HashMap<String, usize> = HashMap::new();
        for entry in table.values() {
            *connections_by_user.entry(entry.user_id.clone()).or_insert(0) += 1;
        }
        SseStats {
            total_connections: table.len(),
            connections_by_user,
            uptime_seconds: self.inner.started_at.elapsed().as_secs(),
            next_event_id: self.inner.next_event_id.load(Ordering::Relaxed),
        }
    }

    /// Returns the redacted client listing.
    #[must_use]
    pub fn get_clients(&self) -> Vec<SseClientInfo> {
        let table = self.table();
        table
            .values()
            .map(|entry| SseClientInfo {
                user_id: entry.user_id.clone(),
                project_id: entry.filter.project_id,
                entities: entry.filter.entities.clone(),
                connected_at: entry.connected_at,
                connection_duration_ms: u64::try_from(
                    entry.connected_instant.elapsed().as_millis(),
                )
                .unwrap_or(u64::MAX),
            })
            .collect()
    }

    /// Runs the forwarder loop, fanning out listener events until the
    /// channel closes.
    pub async fn run_forwarder(self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            self.broadcast(&event);
        }
        tracing::debug!("sse forwarder stopped");
    }
}

// ============================================================================
// SECTION: Subscription Stream
// ============================================================================

/// Frame stream handed to the HTTP layer; removes its subscriber on drop.
pub struct SseSubscription {
    /// Owning service.
    service: SseService,
    /// Subscription id.
    id: u64,
    /// Outbound frames.
    frames: ReceiverStream<Event>,
}

impl Stream for SseSubscription {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx).map(|item| item.map(Ok))
    }
}

impl Drop for SseSubscription {
    fn drop(&mut self) {
        self.service.remove(self.id, "closed");
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

    use std::time::Duration;

    use aidis_core::ChangeAction;
    use aidis_core::ChangeEvent;
    use aidis_core::EntityKind;
    use aidis_core::ProjectId;
    use chrono::Utc;
    use tokio_stream::StreamExt;

    use super::SseService;
    use super::SseSubscription;
    use super::SubscriberFilter;

    fn service() -> SseService {
        SseService::new(aidis_config::SseConfig {
            max_connections_per_user: 5,
            heartbeat_interval: Duration::from_secs(15),
            retry_hint_ms: 5_000,
        })
    }

    fn event(entity: EntityKind, id: &str, project: Option<ProjectId>) -> ChangeEvent {
        ChangeEvent {
            entity,
            action: ChangeAction::Update,
            id: id.to_string(),
            project_id: project,
            at: Utc::now(),
        }
    }

    async fn next_data(subscription: &mut SseSubscription) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .expect("frame within deadline")
            .expect("stream open")
            .expect("frame");
        format!("{frame:?}")
    }

    #[tokio::test]
    async fn greeting_frames_carry_retry_and_connected() {
        let service = service();
        let mut stream =
            service.subscribe("user-1", SubscriberFilter::default()).expect("subscribe");
        let retry = next_data(&mut stream).await;
        assert!(retry.contains("5000"), "missing retry hint: {retry}");
        let connected = next_data(&mut stream).await;
        assert!(connected.contains("connected"), "missing connected event: {connected}");
        assert!(connected.contains("user-1"));
    }

    #[tokio::test]
    async fn entity_filter_gates_delivery() {
        let service = service();
        let mut tasks_only = service
            .subscribe("a", SubscriberFilter {
                project_id: None,
                entities: Some(vec![EntityKind::Tasks]),
            })
            .expect("subscribe");
        // Drain greetings.
        let _ = next_data(&mut tasks_only).await;
        let _ = next_data(&mut tasks_only).await;

        service.broadcast(&event(EntityKind::Contexts, "c1", None));
        service.broadcast(&event(EntityKind::Tasks, "t1", None));
        let frame = next_data(&mut tasks_only).await;
        assert!(frame.contains("t1"), "expected the task event, got {frame}");
    }

    #[tokio::test]
    async fn project_filter_passes_unscoped_events() {
        let service = service();
        let p1 = ProjectId::new();
        let p2 = ProjectId::new();
        let mut scoped = service
            .subscribe("a", SubscriberFilter {
                project_id: Some(p1),
                entities: None,
            })
            .expect("subscribe");
        let _ = next_data(&mut scoped).await;
        let _ = next_data(&mut scoped).await;

        service.broadcast(&event(EntityKind::Contexts, "other", Some(p2)));
        service.broadcast(&event(EntityKind::Contexts, "mine", Some(p1)));
        service.broadcast(&event(EntityKind::Agents, "unscoped", None));

        let first = next_data(&mut scoped).await;
        assert!(first.contains("mine"), "expected own-project event, got {first}");
        let second = next_data(&mut scoped).await;
        assert!(second.contains("unscoped"), "expected unscoped event, got {second}");
    }

    #[tokio::test]
    async fn event_ids_increase_per_subscriber() {
        let service = service();
        let mut stream =
            service.subscribe("a", SubscriberFilter::default()).expect("subscribe");
        let _ = next_data(&mut stream).await;
        let _ = next_data(&mut stream).await;
        for n in 0..5 {
            service.broadcast(&event(EntityKind::Tasks, &format!("t{n}"), None));
        }
        let mut last_id = 0_u64;
        for _ in 0..5 {
            let frame = next_data(&mut stream).await;
            let id = extract_id(&frame);
            assert!(id > last_id, "ids must strictly increase: {last_id} then {id}");
            last_id = id;
        }
    }

    fn extract_id(frame: &str) -> u64 {
        // The id field is written first into the frame buffer, so the
        // first digit run in the debug output is the event id.
        let digits: Vec<u64> = frame
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        *digits.first().unwrap_or(&0)
    }

    #[tokio::test]
    async fn per_user_cap_rejects_the_sixth_stream() {
        let service = service();
        let mut held = Vec::new();
        for _ in 0..5 {
            held.push(service.subscribe("u", SubscriberFilter::default()).expect("subscribe"));
        }
        assert!(service.subscribe("u", SubscriberFilter::default()).is_err());
        // A different user is unaffected.
        assert!(service.subscribe("v", SubscriberFilter::default()).is_ok());
    }

    #[tokio::test]
    async fn dropping_the_stream_removes_the_subscriber() {
        let service = service();
        let stream = service.subscribe("u", SubscriberFilter::default()).expect("subscribe");
        assert_eq!(service.get_stats().total_connections, 1);
        drop(stream);
        assert_eq!(service.get_stats().total_connections, 0);
    }

    #[tokio::test]
    async fn disconnect_all_empties_the_table_and_ends_streams() {
        let service = service();
        let mut first = service.subscribe("a", SubscriberFilter::default()).expect("subscribe");
        let mut second = service.subscribe("b", SubscriberFilter::default()).expect("subscribe");
        for stream in [&mut first, &mut second] {
            let _ = next_data(stream).await;
            let _ = next_data(stream).await;
        }
        service.disconnect_all();
        assert_eq!(service.get_stats().total_connections, 0);
        let frame = next_data(&mut first).await;
        assert!(frame.contains("server-shutdown"), "expected shutdown event, got {frame}");
        // After the shutdown frame, the stream ends.
        let _ = next_data(&mut second).await;
        assert!(
            tokio::time::timeout(Duration::from_secs(1), second.next())
                .await
                .expect("deadline")
                .is_none()
        );
    }

    #[tokio::test]
    async fn stats_and_clients_reflect_the_table() {
        let service = service();
        let project = ProjectId::new();
        let _a = service
            .subscribe("alice", SubscriberFilter {
                project_id: Some(project),
                entities: Some(vec![EntityKind::Contexts]),
            })
            .expect("subscribe");
        let _b = service.subscribe("alice", SubscriberFilter::default()).expect("subscribe");
        let stats = service.get_stats();
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.connections_by_user.get("alice"), Some(&2));
        let clients = service.get_clients();
        assert_eq!(clients.len(), 2);
        assert!(clients.iter().any(|client| client.project_id == Some(project)));
    }

    #[tokio::test]
    async fn broadcast_to_many_subscribers_reaches_everyone() {
        let service = service();
        let mut streams = Vec::new();
        for n in 0..100 {
            let mut stream = service
                .subscribe(format!("user-{n}"), SubscriberFilter::default())
                .expect("subscribe");
            let _ = next_data(&mut stream).await;
            let _ = next_data(&mut stream).await;
            streams.push(stream);
        }
        service.broadcast(&event(EntityKind::Tasks, "fanout", None));
        for stream in &mut streams {
            let frame = next_data(stream).await;
            assert!(frame.contains("fanout"));
        }
    }
}
