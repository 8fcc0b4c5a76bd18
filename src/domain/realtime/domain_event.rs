//! Coarse change notifications pushed to subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change a [`DomainEvent`] announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DomainEventKind {
    #[serde(rename = "chat.upserted")]
    ChatUpserted,
    #[serde(rename = "chat.deleted")]
    ChatDeleted,
    #[serde(rename = "message.upserted")]
    MessageUpserted,
    #[serde(rename = "message.deleted")]
    MessageDeleted,
}

impl DomainEventKind {
    /// Wire name used as the `type` of pushed messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainEventKind::ChatUpserted => "chat.upserted",
            DomainEventKind::ChatDeleted => "chat.deleted",
            DomainEventKind::MessageUpserted => "message.upserted",
            DomainEventKind::MessageDeleted => "message.deleted",
        }
    }
}

impl fmt::Display for DomainEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to one chat, derived from a sync batch.
///
/// `ids` is always sorted and free of duplicates: the chat ID itself for
/// chat events, message IDs for message events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub kind: DomainEventKind,
    pub chat_id: String,
    pub ids: Vec<String>,
}

impl DomainEvent {
    pub fn chat_upserted(chat_id: impl Into<String>) -> Self {
        Self::for_chat(DomainEventKind::ChatUpserted, chat_id.into())
    }

    pub fn chat_deleted(chat_id: impl Into<String>) -> Self {
        Self::for_chat(DomainEventKind::ChatDeleted, chat_id.into())
    }

    /// Creates a message event; `ids` are sorted and deduplicated.
    pub fn for_messages(
        kind: DomainEventKind,
        chat_id: impl Into<String>,
        ids: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut ids: Vec<String> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self {
            kind,
            chat_id: chat_id.into(),
            ids,
        }
    }

    fn for_chat(kind: DomainEventKind, chat_id: String) -> Self {
        Self {
            kind,
            ids: vec![chat_id.clone()],
            chat_id,
        }
    }
}
