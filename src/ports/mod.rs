//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Chat Client Ports
//!
//! - `SyncSource` - Subscription to the chat client's event stream
//! - `ChatReader` - Read-only room, event, member and reaction queries
//!
//! ## Hydration Ports
//!
//! - `MessageLookup` - Message IDs to wire messages, consumed by the hub

mod chat_reader;
mod message_lookup;
mod sync_source;

pub use chat_reader::{ChatReader, ChatReaderError, Room};
pub use message_lookup::MessageLookup;
pub use sync_source::{SyncCallback, SyncSource, SyncSourceError, SyncSubscription};
