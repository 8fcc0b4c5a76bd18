//! Sync batch shapes emitted by the Matrix client.
//!
//! The client hands out untyped `{command, data}` payloads. They are decoded
//! once, at the boundary, into [`ClientEvent`]; everything past the boundary
//! works with the typed [`SyncBatch`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event_type;

/// Command name of the payload carrying a [`SyncBatch`].
pub const SYNC_COMPLETE_COMMAND: &str = "sync_complete";

/// Undecoded payload as delivered by the chat client's event buffer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawClientEvent {
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

/// Decoded client event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// One sync cycle completed.
    SyncComplete(Box<SyncBatch>),
    /// Any other command (typing, receipts, account state, ...).
    Other { command: String },
}

impl ClientEvent {
    /// Returns the sync batch if this event carries one.
    pub fn as_sync_batch(&self) -> Option<&SyncBatch> {
        match self {
            ClientEvent::SyncComplete(batch) => Some(batch),
            ClientEvent::Other { .. } => None,
        }
    }
}

impl From<SyncBatch> for ClientEvent {
    fn from(batch: SyncBatch) -> Self {
        ClientEvent::SyncComplete(Box::new(batch))
    }
}

impl TryFrom<RawClientEvent> for ClientEvent {
    type Error = serde_json::Error;

    fn try_from(raw: RawClientEvent) -> Result<Self, Self::Error> {
        if raw.command == SYNC_COMPLETE_COMMAND {
            let batch: SyncBatch = serde_json::from_value(raw.data)?;
            Ok(ClientEvent::SyncComplete(Box::new(batch)))
        } else {
            Ok(ClientEvent::Other {
                command: raw.command,
            })
        }
    }
}

/// Everything that changed during one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SyncBatch {
    /// Touched rooms keyed by room ID. Ordered for deterministic mapping.
    #[serde(default)]
    pub rooms: BTreeMap<String, RoomSync>,

    /// Rooms the account left during this cycle.
    #[serde(default)]
    pub left_rooms: Vec<String>,
}

/// Per-room change record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RoomSync {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<Value>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub state: HashMap<String, Value>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub account_data: HashMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<RawEvent>,
}

impl RoomSync {
    pub fn metadata_changed(&self) -> bool {
        matches!(&self.meta, Some(v) if !v.is_null())
    }

    pub fn state_changed(&self) -> bool {
        !self.state.is_empty()
    }

    pub fn account_data_changed(&self) -> bool {
        !self.account_data.is_empty()
    }

    pub fn timeline_changed(&self) -> bool {
        !self.timeline.is_empty()
    }
}

/// Locally rendered content attached to an event by the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LocalContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_html: Option<String>,
}

/// A stored Matrix event as the chat client exposes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawEvent {
    #[serde(default)]
    pub rowid: i64,

    #[serde(default)]
    pub timeline_rowid: i64,

    #[serde(default)]
    pub room_id: String,

    #[serde(default)]
    pub event_id: String,

    #[serde(default)]
    pub sender: String,

    #[serde(rename = "type", default)]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,

    /// Origin server timestamp in Unix milliseconds.
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub content: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrypted: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrypted_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacted_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_content: Option<LocalContent>,
}

impl RawEvent {
    /// Effective event type: the decrypted type for encrypted events.
    pub fn effective_type(&self) -> &str {
        match self.decrypted_type.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.event_type,
        }
    }

    /// Effective content: the decrypted payload for encrypted events.
    pub fn effective_content(&self) -> &Value {
        match &self.decrypted {
            Some(v) if !v.is_null() => v,
            _ => &self.content,
        }
    }

    pub fn is_redacted(&self) -> bool {
        non_empty(self.redacted_by.as_deref()).is_some()
    }

    /// Target of an `m.relates_to` relation, if any.
    pub fn relates_to(&self) -> Option<&str> {
        non_empty(self.relates_to.as_deref())
    }

    pub fn is_edit(&self) -> bool {
        self.relation_type.as_deref() == Some(event_type::REL_REPLACE)
    }

    /// Event ID this event replies to (`m.in_reply_to`).
    pub fn reply_to(&self) -> Option<&str> {
        self.effective_content()
            .pointer("/m.relates_to/m.in_reply_to/event_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sync_complete_payload_decodes_to_batch() {
        let raw: RawClientEvent = serde_json::from_value(json!({
            "command": "sync_complete",
            "data": {
                "rooms": {
                    "!r1:beeper.local": {
                        "meta": {"name": "Room"},
                        "events": [{"event_id": "$e1", "type": "m.room.message"}]
                    }
                },
                "left_rooms": ["!gone:beeper.local"]
            }
        }))
        .unwrap();

        let event = ClientEvent::try_from(raw).unwrap();
        let batch = event.as_sync_batch().expect("sync batch");
        assert_eq!(batch.left_rooms, vec!["!gone:beeper.local"]);
        let room = &batch.rooms["!r1:beeper.local"];
        assert!(room.metadata_changed());
        assert_eq!(room.events[0].event_id, "$e1");
    }

    #[test]
    fn other_commands_decode_to_other() {
        let raw = RawClientEvent {
            command: "typing".to_string(),
            data: json!({"room_id": "!r1", "user_ids": []}),
        };

        let event = ClientEvent::try_from(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Other {
                command: "typing".to_string()
            }
        );
        assert!(event.as_sync_batch().is_none());
    }

    #[test]
    fn malformed_sync_payload_is_an_error() {
        let raw = RawClientEvent {
            command: SYNC_COMPLETE_COMMAND.to_string(),
            data: json!({"rooms": "not-a-map"}),
        };
        assert!(ClientEvent::try_from(raw).is_err());
    }

    #[test]
    fn encrypted_event_uses_decrypted_type_and_content() {
        let event = RawEvent {
            event_type: "m.room.encrypted".to_string(),
            decrypted_type: Some("m.room.message".to_string()),
            content: json!({"ciphertext": "..."}),
            decrypted: Some(json!({"body": "hi"})),
            ..Default::default()
        };

        assert_eq!(event.effective_type(), "m.room.message");
        assert_eq!(event.effective_content()["body"], "hi");
    }

    #[test]
    fn blank_relation_fields_are_ignored() {
        let event = RawEvent {
            relates_to: Some("  ".to_string()),
            redacted_by: Some(String::new()),
            ..Default::default()
        };
        assert!(event.relates_to().is_none());
        assert!(!event.is_redacted());
    }

    #[test]
    fn reply_target_is_read_from_content() {
        let event = RawEvent {
            content: json!({"m.relates_to": {"m.in_reply_to": {"event_id": "$parent"}}}),
            ..Default::default()
        };
        assert_eq!(event.reply_to(), Some("$parent"));
    }
}
