//! Message hydration over the chat client's store.
//!
//! Turns the bare message IDs of a `message.upserted` event into full wire
//! messages, with sender names and reactions resolved.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::message::{map_event_to_message, Message, MessageContext};
use crate::domain::sync::RawEvent;
use crate::ports::{ChatReader, ChatReaderError, MessageLookup};

/// `MessageLookup` backed by a `ChatReader`.
pub struct MessageHydrator {
    reader: Arc<dyn ChatReader>,
}

impl MessageHydrator {
    pub fn new(reader: Arc<dyn ChatReader>) -> Self {
        Self { reader }
    }

    async fn load_events(&self, chat_id: &str, ids: &[String]) -> Vec<RawEvent> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.trim();
            if id.is_empty() || !seen.insert(id) {
                continue;
            }
            match self.reader.event(id).await {
                Ok(Some(event)) if event.room_id == chat_id => events.push(event),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(chat_id, event_id = id, error = %e, "Event lookup failed");
                }
            }
        }
        events
    }
}

#[async_trait]
impl MessageLookup for MessageHydrator {
    async fn lookup_events_by_id(
        &self,
        chat_id: &str,
        ids: &[String],
    ) -> Result<Vec<Message>, ChatReaderError> {
        let Some(room) = self.reader.room(chat_id).await? else {
            return Ok(Vec::new());
        };

        let events = self.load_events(chat_id, ids).await;
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let member_names = self.reader.member_names(chat_id).await.unwrap_or_else(|e| {
            tracing::debug!(chat_id, error = %e, "Member lookup failed");
            HashMap::new()
        });
        let event_ids: Vec<String> = events.iter().map(|e| e.event_id.clone()).collect();
        let reactions = self
            .reader
            .reactions(chat_id, &event_ids)
            .await
            .unwrap_or_else(|e| {
                tracing::debug!(chat_id, error = %e, "Reaction lookup failed");
                HashMap::new()
            });

        let own_user_id = self.reader.own_user_id();
        let ctx = MessageContext {
            account_id: &room.account_id,
            own_user_id: &own_user_id,
            member_names: &member_names,
            reactions: &reactions,
        };

        let mut by_id: HashMap<String, Message> = events
            .iter()
            .filter_map(|event| map_event_to_message(event, &ctx))
            .map(|message| (message.id.clone(), message))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id.trim()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryChatStore;
    use crate::domain::message::MessageType;
    use crate::domain::sync::{event_type, RoomSync, SyncBatch};
    use serde_json::json;

    fn message(room: &str, id: &str, body: &str) -> RawEvent {
        RawEvent {
            room_id: room.to_string(),
            event_id: id.to_string(),
            sender: "@alice:beeper.com".to_string(),
            event_type: event_type::MESSAGE.to_string(),
            timestamp: 1_705_314_600_000,
            content: json!({"msgtype": "m.text", "body": body}),
            ..Default::default()
        }
    }

    fn store_with(rooms: Vec<(&str, Vec<RawEvent>)>) -> Arc<InMemoryChatStore> {
        let store = InMemoryChatStore::new("@alice:beeper.com");
        let mut batch = SyncBatch::default();
        for (room, events) in rooms {
            batch.rooms.insert(
                room.to_string(),
                RoomSync {
                    events,
                    ..Default::default()
                },
            );
        }
        store.apply_batch(&batch);
        Arc::new(store)
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn returns_messages_in_request_order() {
        let store = store_with(vec![(
            "!r1",
            vec![message("!r1", "$a", "first"), message("!r1", "$b", "second")],
        )]);
        let hydrator = MessageHydrator::new(store);

        let messages = hydrator
            .lookup_events_by_id("!r1", &ids(&["$b", "$a"]))
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "$b");
        assert_eq!(messages[0].text, "second");
        assert_eq!(messages[1].id, "$a");
        assert!(messages[1].is_sender);
        assert_eq!(messages[1].message_type, MessageType::Text);
        assert_eq!(messages[1].timestamp, "2024-01-15T10:30:00Z");
    }

    #[tokio::test]
    async fn skips_unknown_and_foreign_events() {
        let store = store_with(vec![
            ("!r1", vec![message("!r1", "$a", "mine")]),
            ("!r2", vec![message("!r2", "$other", "theirs")]),
        ]);
        let hydrator = MessageHydrator::new(store);

        let messages = hydrator
            .lookup_events_by_id("!r1", &ids(&["$missing", "$other", "$a", "$a"]))
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "$a");
    }

    #[tokio::test]
    async fn unknown_room_yields_nothing() {
        let hydrator = MessageHydrator::new(store_with(vec![]));
        let messages = hydrator
            .lookup_events_by_id("!nowhere", &ids(&["$a"]))
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn redacted_events_are_skipped() {
        let mut redacted = message("!r1", "$gone", "oops");
        redacted.redacted_by = Some("$red".to_string());
        let store = store_with(vec![("!r1", vec![redacted])]);
        let hydrator = MessageHydrator::new(store);

        let messages = hydrator
            .lookup_events_by_id("!r1", &ids(&["$gone"]))
            .await
            .unwrap();
        assert!(messages.is_empty());
    }
}
