//! In-memory adapters for the chat client ports.
//!
//! Used by the standalone binary and by tests in place of a live client.

mod chat_store;
mod sync_source;

pub use chat_store::InMemoryChatStore;
pub use sync_source::InMemorySyncSource;
