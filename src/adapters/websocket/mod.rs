//! WebSocket adapters for realtime chat events.
//!
//! This module pushes domain events derived from the chat client's sync
//! stream to subscribed WebSocket clients.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          SyncSource                                  │
//! │   InMemorySyncSource (test, replay) │ chat client (production)      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ sync batches
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          EventHub                                    │
//! │   - Bounded queue, single dispatch task, keepalive pings            │
//! │   - SyncBatch → DomainEvent, hydration, duplicate suppression       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ per-connection writes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ConnectionRegistry                              │
//! │   conn-a: ["*"]        conn-b: ["!r1"]        conn-c: []            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types and command parsing
//! - [`registry`] - Live connections and their subscriptions
//! - [`dedup`] - Fingerprint cache for duplicate suppression
//! - [`hub`] - Event fan-out
//! - [`sink`] - Outbound transport abstraction
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod dedup;
pub mod handler;
pub mod hub;
pub mod messages;
pub mod registry;
pub mod sink;

pub use dedup::{DedupSettings, DuplicateSuppressor};
pub use handler::{websocket_router, ws_handler, WebSocketState, DEFAULT_MAX_MESSAGE_BYTES};
pub use hub::{EventHub, HubError, HubSettings, HubStats};
pub use messages::{
    parse_command, CommandRejection, DomainEventMessage, ErrorMessage, ServerMessage,
    SetSubscriptions, PROTOCOL_VERSION,
};
pub use registry::{ClientConnection, ConnectionRegistry, WriteError};
pub use sink::{ClientSink, SinkError};
