//! In-memory chat store implementing `ChatReader`.
//!
//! Folds sync batches into a small snapshot of rooms, events and members.
//! Backs the standalone binary (fed by a replay file) and the tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::message::{collect_reactions, Reaction};
use crate::domain::sync::{event_type, RawEvent, SyncBatch};
use crate::ports::{ChatReader, ChatReaderError, Room};

#[derive(Default)]
struct StoreState {
    rooms: HashMap<String, Room>,
    events: HashMap<String, RawEvent>,
    /// Room ID → member user ID → display name.
    members: HashMap<String, HashMap<String, String>>,
}

/// In-memory store of rooms and events.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryChatStore::new("@me:beeper.com");
/// store.apply_batch(&batch);
/// assert!(store.room_count() > 0);
/// ```
pub struct InMemoryChatStore {
    own_user_id: String,
    state: RwLock<StoreState>,
}

impl InMemoryChatStore {
    pub fn new(own_user_id: impl Into<String>) -> Self {
        Self {
            own_user_id: own_user_id.into(),
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Folds one sync batch into the store.
    ///
    /// Left rooms are removed with everything they contain. Redactions mark
    /// their target as redacted; member events update display names.
    pub fn apply_batch(&self, batch: &SyncBatch) {
        let mut state = self.write();

        for left in &batch.left_rooms {
            let room_id = left.trim();
            state.rooms.remove(room_id);
            state.members.remove(room_id);
            state.events.retain(|_, event| event.room_id != room_id);
        }

        for (room_id, room) in &batch.rooms {
            let room_id = room_id.trim();
            if room_id.is_empty() {
                continue;
            }
            let default_account = self.default_account_id();
            let entry = state.rooms.entry(room_id.to_string()).or_insert_with(|| Room {
                id: room_id.to_string(),
                name: None,
                account_id: default_account,
            });
            if let Some(meta) = room.meta.as_ref() {
                if let Some(name) = meta.get("name").and_then(Value::as_str) {
                    entry.name = Some(name.to_string());
                }
                if let Some(account) = meta.get("account_id").and_then(Value::as_str) {
                    entry.account_id = account.to_string();
                }
            }

            for event in &room.events {
                let mut event = event.clone();
                if event.room_id.is_empty() {
                    event.room_id = room_id.to_string();
                }
                state.record(event);
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.read().rooms.len()
    }

    pub fn event_count(&self) -> usize {
        self.read().events.len()
    }

    fn default_account_id(&self) -> String {
        format!("matrix_{}", self.own_user_id)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreState {
    fn record(&mut self, event: RawEvent) {
        let evt_type = event.effective_type().to_string();

        if evt_type == event_type::REDACTION {
            if let Some(target) = event.relates_to().map(str::to_string) {
                if let Some(original) = self.events.get_mut(&target) {
                    original.redacted_by = Some(event.event_id.clone());
                }
            }
        }

        if evt_type == event_type::MEMBER {
            self.record_member(&event);
        }

        let event_id = event.event_id.trim().to_string();
        if !event_id.is_empty() {
            self.events.insert(event_id, event);
        }
    }

    fn record_member(&mut self, event: &RawEvent) {
        let Some(user_id) = event.state_key.as_deref().filter(|key| !key.is_empty()) else {
            return;
        };
        let content = event.effective_content();
        let members = self.members.entry(event.room_id.clone()).or_default();

        let membership = content.get("membership").and_then(Value::as_str).unwrap_or("join");
        if matches!(membership, "leave" | "ban") {
            members.remove(user_id);
            return;
        }
        let name = content
            .get("displayname")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(user_id);
        members.insert(user_id.to_string(), name.to_string());
    }
}

impl Default for InMemoryChatStore {
    fn default() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl ChatReader for InMemoryChatStore {
    fn own_user_id(&self) -> String {
        self.own_user_id.clone()
    }

    async fn room(&self, chat_id: &str) -> Result<Option<Room>, ChatReaderError> {
        Ok(self.read().rooms.get(chat_id).cloned())
    }

    async fn event(&self, event_id: &str) -> Result<Option<RawEvent>, ChatReaderError> {
        Ok(self.read().events.get(event_id).cloned())
    }

    async fn member_names(
        &self,
        chat_id: &str,
    ) -> Result<HashMap<String, String>, ChatReaderError> {
        Ok(self.read().members.get(chat_id).cloned().unwrap_or_default())
    }

    async fn reactions(
        &self,
        chat_id: &str,
        event_ids: &[String],
    ) -> Result<HashMap<String, Vec<Reaction>>, ChatReaderError> {
        let state = self.read();
        let mut by_target: HashMap<String, Vec<RawEvent>> = HashMap::new();
        for event in state.events.values() {
            if event.room_id != chat_id || event.effective_type() != event_type::REACTION {
                continue;
            }
            let Some(target) = event.relates_to() else {
                continue;
            };
            if event_ids.iter().any(|id| id == target) {
                by_target.entry(target.to_string()).or_default().push(event.clone());
            }
        }

        Ok(by_target
            .into_iter()
            .filter_map(|(target, mut events)| {
                events.sort_by_key(|event| event.timestamp);
                let reactions = collect_reactions(&events);
                (!reactions.is_empty()).then_some((target, reactions))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sync::RoomSync;
    use serde_json::json;

    fn event(room: &str, id: &str, evt_type: &str) -> RawEvent {
        RawEvent {
            room_id: room.to_string(),
            event_id: id.to_string(),
            sender: "@alice:beeper.com".to_string(),
            event_type: evt_type.to_string(),
            ..Default::default()
        }
    }

    fn batch(room: &str, events: Vec<RawEvent>) -> SyncBatch {
        let mut batch = SyncBatch::default();
        batch.rooms.insert(
            room.to_string(),
            RoomSync {
                meta: Some(json!({"name": "Team"})),
                events,
                ..Default::default()
            },
        );
        batch
    }

    #[tokio::test]
    async fn apply_batch_records_rooms_and_events() {
        let store = InMemoryChatStore::new("@me:beeper.com");
        store.apply_batch(&batch("!r1", vec![event("!r1", "$e1", event_type::MESSAGE)]));

        let room = store.room("!r1").await.unwrap().unwrap();
        assert_eq!(room.name.as_deref(), Some("Team"));
        assert_eq!(room.account_id, "matrix_@me:beeper.com");
        assert!(store.event("$e1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn redaction_marks_target() {
        let store = InMemoryChatStore::default();
        store.apply_batch(&batch("!r1", vec![event("!r1", "$e1", event_type::MESSAGE)]));

        let mut redaction = event("!r1", "$red", event_type::REDACTION);
        redaction.relates_to = Some("$e1".to_string());
        store.apply_batch(&batch("!r1", vec![redaction]));

        let target = store.event("$e1").await.unwrap().unwrap();
        assert_eq!(target.redacted_by.as_deref(), Some("$red"));
    }

    #[tokio::test]
    async fn member_events_track_display_names() {
        let store = InMemoryChatStore::default();
        let mut join = event("!r1", "$m1", event_type::MEMBER);
        join.state_key = Some("@bob:beeper.com".to_string());
        join.content = json!({"membership": "join", "displayname": " Bob "});
        store.apply_batch(&batch("!r1", vec![join]));

        let names = store.member_names("!r1").await.unwrap();
        assert_eq!(names.get("@bob:beeper.com").map(String::as_str), Some("Bob"));

        let mut leave = event("!r1", "$m2", event_type::MEMBER);
        leave.state_key = Some("@bob:beeper.com".to_string());
        leave.content = json!({"membership": "leave"});
        store.apply_batch(&batch("!r1", vec![leave]));
        assert!(store.member_names("!r1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reactions_are_grouped_by_target() {
        let store = InMemoryChatStore::default();
        let mut thumbs = event("!r1", "$react", event_type::REACTION);
        thumbs.relates_to = Some("$e1".to_string());
        thumbs.content = json!({"m.relates_to": {"rel_type": "m.annotation", "event_id": "$e1", "key": "👍"}});
        store.apply_batch(&batch(
            "!r1",
            vec![event("!r1", "$e1", event_type::MESSAGE), thumbs],
        ));

        let reactions = store
            .reactions("!r1", &["$e1".to_string(), "$e2".to_string()])
            .await
            .unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions["$e1"][0].reaction_key, "👍");
        assert!(reactions["$e1"][0].emoji);
    }

    #[tokio::test]
    async fn left_rooms_are_removed() {
        let store = InMemoryChatStore::default();
        store.apply_batch(&batch("!r1", vec![event("!r1", "$e1", event_type::MESSAGE)]));
        store.apply_batch(&SyncBatch {
            left_rooms: vec!["!r1".to_string()],
            ..Default::default()
        });

        assert_eq!(store.room_count(), 0);
        assert_eq!(store.event_count(), 0);
    }
}
