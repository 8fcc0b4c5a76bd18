//! Connection registry for subscription-based message routing.
//!
//! Connections are keyed by ID; each carries the chat subscription it set
//! last. The hub asks the registry which connections match a chat.
//!
//! # Locking
//!
//! ```text
//! registry RwLock  (register / unregister / set_subscription: write)
//!   └── per-connection sink Mutex  (every write on that connection)
//! ```
//!
//! The registry lock is never held across a write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::Subscription;

use super::sink::{ClientSink, SinkError};

/// Failure to deliver one message to one connection.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Write timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One live WebSocket client.
///
/// The sequence counter starts at zero, so the first event delivered on a
/// connection carries `seq = 1`.
pub struct ClientConnection {
    id: ConnectionId,
    sink: Mutex<Box<dyn ClientSink>>,
    seq: AtomicU64,
    write_timeout: Duration,
}

impl ClientConnection {
    pub fn new(sink: Box<dyn ClientSink>, write_timeout: Duration) -> Self {
        Self {
            id: ConnectionId::new(),
            sink: Mutex::new(sink),
            seq: AtomicU64::new(0),
            write_timeout,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Claims the next sequence number for a delivered event.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last sequence number handed out.
    pub fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Serializes `message` and writes it as one text frame.
    pub async fn send_json<T: Serialize>(&self, message: &T) -> Result<(), WriteError> {
        let text = serde_json::to_string(message)?;
        self.send_text(text).await
    }

    pub async fn send_text(&self, text: String) -> Result<(), WriteError> {
        let timeout = self.write_timeout;
        let mut sink = self.sink.lock().await;
        tokio::time::timeout(timeout, sink.send_text(text))
            .await
            .map_err(|_| WriteError::Timeout(timeout))??;
        Ok(())
    }

    pub async fn ping(&self, timeout: Duration) -> Result<(), WriteError> {
        let mut sink = self.sink.lock().await;
        tokio::time::timeout(timeout, sink.ping())
            .await
            .map_err(|_| WriteError::Timeout(timeout))??;
        Ok(())
    }

    /// Best-effort close; errors are only logged.
    pub async fn close(&self) {
        let timeout = self.write_timeout;
        let mut sink = self.sink.lock().await;
        match tokio::time::timeout(timeout, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::trace!(connection_id = %self.id, "Close failed: {}", e),
            Err(_) => tracing::trace!(connection_id = %self.id, "Close timed out"),
        }
    }
}

struct Registration {
    connection: Arc<ClientConnection>,
    subscription: Subscription,
}

/// Registry of live connections and their subscriptions.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Registration>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection with an empty subscription.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        self.connections.write().await.insert(
            connection.id(),
            Registration {
                connection,
                subscription: Subscription::None,
            },
        );
    }

    /// Removes a connection, returning it if it was still registered.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections
            .write()
            .await
            .remove(id)
            .map(|registration| registration.connection)
    }

    /// Replaces a connection's subscription.
    ///
    /// Returns `false` if the connection is no longer registered.
    pub async fn set_subscription(&self, id: &ConnectionId, subscription: Subscription) -> bool {
        match self.connections.write().await.get_mut(id) {
            Some(registration) => {
                registration.subscription = subscription;
                true
            }
            None => false,
        }
    }

    pub async fn subscription(&self, id: &ConnectionId) -> Option<Subscription> {
        self.connections
            .read()
            .await
            .get(id)
            .map(|registration| registration.subscription.clone())
    }

    /// Connections whose subscription matches `chat_id`.
    pub async fn matching(&self, chat_id: &str) -> Vec<Arc<ClientConnection>> {
        self.connections
            .read()
            .await
            .values()
            .filter(|registration| registration.subscription.matches(chat_id))
            .map(|registration| Arc::clone(&registration.connection))
            .collect()
    }

    pub async fn all(&self) -> Vec<Arc<ClientConnection>> {
        self.connections
            .read()
            .await
            .values()
            .map(|registration| Arc::clone(&registration.connection))
            .collect()
    }

    /// Removes and returns every connection.
    pub async fn drain(&self) -> Vec<Arc<ClientConnection>> {
        self.connections
            .write()
            .await
            .drain()
            .map(|(_, registration)| registration.connection)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
