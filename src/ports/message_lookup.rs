//! MessageLookup port - Resolves message IDs into wire messages.

use async_trait::async_trait;

use crate::domain::message::Message;

use super::ChatReaderError;

/// Port for hydrating message IDs of one chat.
#[async_trait]
pub trait MessageLookup: Send + Sync {
    /// Returns the messages for `ids` in request order.
    ///
    /// IDs that are unknown, belong to another chat, or do not render as a
    /// message (redacted, edits, state) are skipped silently.
    async fn lookup_events_by_id(
        &self,
        chat_id: &str,
        ids: &[String],
    ) -> Result<Vec<Message>, ChatReaderError>;
}
