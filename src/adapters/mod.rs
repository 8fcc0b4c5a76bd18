//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `hydration` - Message lookup over a chat reader
//! - `http` - Router, error responses and access token middleware
//! - `memory` - In-memory chat store and sync source
//! - `replay` - NDJSON replay of recorded client events
//! - `websocket` - Event hub and WebSocket connections

pub mod hydration;
pub mod http;
pub mod memory;
pub mod replay;
pub mod websocket;

pub use hydration::MessageHydrator;
pub use memory::{InMemoryChatStore, InMemorySyncSource};
pub use replay::{ReplayFeed, ReplayStats};
pub use websocket::{EventHub, HubSettings, WebSocketState};
