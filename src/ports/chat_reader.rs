//! ChatReader port - Read-only queries against the chat client's store.
//!
//! Used to hydrate message upserts before they are pushed. Lookups are
//! cheap local database reads in the real client.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::message::Reaction;
use crate::domain::sync::RawEvent;

/// A room as known to the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: Option<String>,
    /// Bridge account the room belongs to (`matrix` for native rooms).
    pub account_id: String,
}

/// Errors from the chat client's store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatReaderError {
    #[error("Chat client is not initialized")]
    NotInitialized,

    #[error("Store query failed: {0}")]
    Query(String),
}

/// Port for reading rooms, events, members and reactions.
///
/// `Ok(None)` means "not found"; errors are reserved for store failures.
#[async_trait]
pub trait ChatReader: Send + Sync {
    /// The logged-in user's Matrix ID, empty when unknown.
    fn own_user_id(&self) -> String;

    async fn room(&self, chat_id: &str) -> Result<Option<Room>, ChatReaderError>;

    async fn event(&self, event_id: &str) -> Result<Option<RawEvent>, ChatReaderError>;

    /// Member user ID → display name for one room.
    async fn member_names(
        &self,
        chat_id: &str,
    ) -> Result<HashMap<String, String>, ChatReaderError>;

    /// Aggregated reactions keyed by target event ID.
    async fn reactions(
        &self,
        chat_id: &str,
        event_ids: &[String],
    ) -> Result<HashMap<String, Vec<Reaction>>, ChatReaderError>;
}
