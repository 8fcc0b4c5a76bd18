//! Event hub connecting the chat client's sync stream to WebSocket clients.
//!
//! # Event Flow
//!
//! ```text
//! SyncSource callback
//!          │ try_send (drop newest when full)
//!          ▼
//! ┌────────────────────┐
//! │  bounded queue     │
//! └────────────────────┘
//!          │ single dispatch task
//!          ▼
//! ┌────────────────────┐
//! │  map_sync_batch    │
//! └────────────────────┘
//!          │ per domain event
//!          ▼
//! ┌────────────────────┐
//! │  match, hydrate,   │
//! │  deduplicate       │
//! └────────────────────┘
//!          │ concurrent per-connection writes
//!          ▼
//!   subscribed clients
//! ```
//!
//! Events are dispatched one at a time: all writes for one event finish
//! before the next event starts, which keeps per-connection order equal to
//! dispatch order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::foundation::{ConnectionId, Timestamp};
use crate::domain::realtime::{
    fingerprint, map_sync_batch, DomainEvent, DomainEventKind, Subscription,
};
use crate::domain::sync::{ClientEvent, SyncBatch};
use crate::ports::{MessageLookup, SyncCallback, SyncSource, SyncSourceError, SyncSubscription};

use super::dedup::{DedupSettings, DuplicateSuppressor};
use super::messages::DomainEventMessage;
use super::registry::{ClientConnection, ConnectionRegistry};
use super::sink::ClientSink;

/// Tunables of the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub queue_capacity: usize,
    pub keepalive_interval: Duration,
    pub ping_timeout: Duration,
    pub write_timeout: Duration,
    pub dedup: DedupSettings,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 512,
            keepalive_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            dedup: DedupSettings::default(),
        }
    }
}

/// Hub start-up failures.
///
/// Cloneable because the first outcome is cached and handed to every
/// later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Failed to subscribe to chat events: {0}")]
    Subscribe(#[from] SyncSourceError),

    #[error("Event hub has been shut down")]
    ShutDown,
}

/// Point-in-time counters of the hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub connections: usize,
    pub batches_received: u64,
    pub batches_dropped: u64,
    pub events_delivered: u64,
    pub events_suppressed: u64,
}

#[derive(Default)]
struct Counters {
    batches_received: AtomicU64,
    batches_dropped: AtomicU64,
    events_delivered: AtomicU64,
    events_suppressed: AtomicU64,
}

/// State shared between the hub handle and its dispatch task.
struct HubCore {
    registry: ConnectionRegistry,
    lookup: Arc<dyn MessageLookup>,
    dedup: DuplicateSuppressor,
    counters: Counters,
    ping_timeout: Duration,
}

struct Running {
    subscription: SyncSubscription,
    dispatch: JoinHandle<()>,
}

/// Fan-out hub for realtime domain events.
///
/// # Example
///
/// ```ignore
/// let hub = Arc::new(EventHub::new(sync_source, hydrator, HubSettings::default()));
/// hub.ensure_started().await?;
/// let conn = hub.new_connection(Box::new(sink));
/// hub.register(conn.clone()).await;
/// ```
pub struct EventHub {
    core: Arc<HubCore>,
    source: Arc<dyn SyncSource>,
    settings: HubSettings,
    started: OnceCell<Result<(), HubError>>,
    running: Mutex<Option<Running>>,
    shut_down: AtomicBool,
}

impl EventHub {
    pub fn new(
        source: Arc<dyn SyncSource>,
        lookup: Arc<dyn MessageLookup>,
        settings: HubSettings,
    ) -> Self {
        Self {
            core: Arc::new(HubCore {
                registry: ConnectionRegistry::new(),
                lookup,
                dedup: DuplicateSuppressor::new(settings.dedup),
                counters: Counters::default(),
                ping_timeout: settings.ping_timeout,
            }),
            source,
            settings,
            started: OnceCell::new(),
            running: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Subscribes to the sync source on first use.
    ///
    /// Concurrent callers share one subscribe attempt. Its outcome, failure
    /// included, is returned to every caller for the life of the hub.
    pub async fn ensure_started(&self) -> Result<(), HubError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(HubError::ShutDown);
        }
        self.started
            .get_or_init(|| async { self.start() })
            .await
            .clone()
    }

    fn start(&self) -> Result<(), HubError> {
        let (tx, rx) = mpsc::channel::<Box<SyncBatch>>(self.settings.queue_capacity);
        let core = Arc::clone(&self.core);

        let callback: SyncCallback = Arc::new(move |event: ClientEvent| {
            let ClientEvent::SyncComplete(batch) = event else {
                return;
            };
            match tx.try_send(batch) {
                Ok(()) => {
                    core.counters.batches_received.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Full(_)) => {
                    let dropped = core.counters.batches_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::warn!(
                        dropped_total = dropped,
                        "Event queue full, dropping sync batch"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!("Event queue closed, ignoring sync batch");
                }
            }
        });

        let subscription = self.source.subscribe(callback).map_err(|e| {
            tracing::error!(error = %e, "Failed to subscribe to chat events");
            HubError::from(e)
        })?;

        let dispatch = tokio::spawn(dispatch_loop(
            Arc::clone(&self.core),
            rx,
            self.settings.keepalive_interval,
        ));

        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = Some(Running {
            subscription,
            dispatch,
        });
        tracing::info!(
            queue_capacity = self.settings.queue_capacity,
            "Realtime event hub started"
        );
        Ok(())
    }

    /// Creates an unregistered connection around `sink`.
    pub fn new_connection(&self, sink: Box<dyn ClientSink>) -> Arc<ClientConnection> {
        Arc::new(ClientConnection::new(sink, self.settings.write_timeout))
    }

    /// Registers a connection with an empty subscription.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        let id = connection.id();
        self.core.registry.register(connection).await;
        tracing::debug!(connection_id = %id, "Client registered");
    }

    /// Unregisters and closes a connection.
    pub async fn disconnect(&self, id: &ConnectionId) {
        self.core.drop_connection(id).await;
    }

    /// Replaces a connection's subscription.
    pub async fn set_subscription(&self, id: &ConnectionId, subscription: Subscription) -> bool {
        let updated = self.core.registry.set_subscription(id, subscription).await;
        tracing::debug!(connection_id = %id, updated, "Subscription replaced");
        updated
    }

    /// Current subscription of a registered connection.
    pub async fn subscription(&self, id: &ConnectionId) -> Option<Subscription> {
        self.core.registry.subscription(id).await
    }

    pub async fn connection_count(&self) -> usize {
        self.core.registry.len().await
    }

    pub async fn stats(&self) -> HubStats {
        let counters = &self.core.counters;
        HubStats {
            connections: self.core.registry.len().await,
            batches_received: counters.batches_received.load(Ordering::Relaxed),
            batches_dropped: counters.batches_dropped.load(Ordering::Relaxed),
            events_delivered: counters.events_delivered.load(Ordering::Relaxed),
            events_suppressed: counters.events_suppressed.load(Ordering::Relaxed),
        }
    }

    /// Stops dispatch, releases the sync subscription and closes every
    /// connection. Later `ensure_started` calls fail with [`HubError::ShutDown`].
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);

        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Running {
            subscription,
            dispatch,
        }) = running
        {
            dispatch.abort();
            subscription.unsubscribe();
        }

        let connections = self.core.registry.drain().await;
        let closed = connections.len();
        join_all(connections.iter().map(|conn| conn.close())).await;
        tracing::info!(closed_connections = closed, "Realtime event hub stopped");
    }
}

async fn dispatch_loop(
    core: Arc<HubCore>,
    mut queue: mpsc::Receiver<Box<SyncBatch>>,
    keepalive: Duration,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + keepalive, keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            batch = queue.recv() => match batch {
                Some(batch) => core.process_batch(&batch).await,
                None => break,
            },
            _ = ticker.tick() => core.ping_all().await,
        }
    }
    tracing::debug!("Dispatch loop finished");
}

impl HubCore {
    async fn process_batch(&self, batch: &SyncBatch) {
        for event in map_sync_batch(batch) {
            self.dispatch(&event).await;
        }
    }

    async fn dispatch(&self, event: &DomainEvent) {
        let targets = self.registry.matching(&event.chat_id).await;
        if targets.is_empty() {
            return;
        }

        let entries = if event.kind == DomainEventKind::MessageUpserted {
            match self.hydrate(event).await {
                Some(entries) => Some(entries),
                None => return,
            }
        } else {
            None
        };

        let print = fingerprint(event, entries.as_deref().unwrap_or_default());
        if self.dedup.is_duplicate(&print, Instant::now()) {
            self.counters.events_suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                event_type = %event.kind,
                chat_id = %event.chat_id,
                "Suppressed duplicate event"
            );
            return;
        }

        let ts = Timestamp::now().as_unix_millis();
        let writes = targets.into_iter().map(|conn| {
            let message = DomainEventMessage::new(event, conn.next_seq(), ts, entries.clone());
            async move {
                let result = conn.send_json(&message).await;
                (conn, message.seq, result)
            }
        });

        for (conn, seq, result) in join_all(writes).await {
            match result {
                Ok(()) => {
                    self.counters.events_delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(
                        connection_id = %conn.id(),
                        event_type = %event.kind,
                        seq,
                        "Delivered event"
                    );
                }
                Err(e) => {
                    tracing::debug!(connection_id = %conn.id(), "Write failed, closing: {}", e);
                    self.drop_connection(&conn.id()).await;
                }
            }
        }
    }

    /// Hydrated message entries, or `None` when nothing resolvable remains.
    async fn hydrate(&self, event: &DomainEvent) -> Option<Vec<Value>> {
        let messages = match self
            .lookup
            .lookup_events_by_id(&event.chat_id, &event.ids)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::debug!(chat_id = %event.chat_id, error = %e, "Hydration failed");
                return None;
            }
        };

        let entries: Vec<Value> = messages
            .iter()
            .filter_map(|message| serde_json::to_value(message).ok())
            .collect();
        if entries.is_empty() {
            tracing::debug!(chat_id = %event.chat_id, "No hydratable messages, dropping event");
            return None;
        }
        Some(entries)
    }

    async fn ping_all(&self) {
        let connections = self.registry.all().await;
        let pings = connections.into_iter().map(|conn| async move {
            let result = conn.ping(self.ping_timeout).await;
            (conn, result)
        });

        for (conn, result) in join_all(pings).await {
            if let Err(e) = result {
                tracing::debug!(connection_id = %conn.id(), "Keepalive ping failed: {}", e);
                self.drop_connection(&conn.id()).await;
            }
        }
    }

    async fn drop_connection(&self, id: &ConnectionId) {
        if let Some(conn) = self.registry.unregister(id).await {
            conn.close().await;
            tracing::debug!(connection_id = %id, "Client unregistered");
        }
    }
}
