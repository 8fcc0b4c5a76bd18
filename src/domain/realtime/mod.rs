//! Realtime module - domain events, subscriptions and fingerprints.
//!
//! Everything here is pure: the WebSocket hub in
//! `adapters::websocket` owns the clocks, locks and sockets.

mod domain_event;
mod fingerprint;
mod mapper;
mod subscription;

pub use domain_event::{DomainEvent, DomainEventKind};
pub use fingerprint::fingerprint;
pub use mapper::map_sync_batch;
pub use subscription::{Subscription, SubscriptionError, WILDCARD_CHAT_ID};
