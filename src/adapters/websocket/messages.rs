//! WebSocket message types for the realtime events protocol.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: ready, subscription acknowledgements, errors, domain events
//! - Client → Server: `subscriptions.set`

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::realtime::{DomainEvent, DomainEventKind, Subscription};

/// Protocol version announced in the `ready` message.
pub const PROTOCOL_VERSION: u32 = 1;

/// The only command clients may send.
pub const SUBSCRIPTIONS_SET_COMMAND: &str = "subscriptions.set";

const NOT_AN_OBJECT: &str = "Payload must be an object with a type field";

// ============================================
// Server → Client Messages
// ============================================

/// Control messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once, right after the upgrade.
    #[serde(rename = "ready")]
    Ready(ReadyMessage),

    /// Acknowledges `subscriptions.set`.
    #[serde(rename = "subscriptions.updated")]
    SubscriptionsUpdated(SubscriptionsUpdatedMessage),

    /// A rejected client frame.
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

impl ServerMessage {
    pub fn ready() -> Self {
        ServerMessage::Ready(ReadyMessage {
            version: PROTOCOL_VERSION,
            chat_ids: Vec::new(),
        })
    }

    pub fn subscriptions_updated(request_id: Option<String>, subscription: &Subscription) -> Self {
        ServerMessage::SubscriptionsUpdated(SubscriptionsUpdatedMessage {
            request_id,
            chat_ids: subscription.chat_ids(),
        })
    }

    pub fn error(request_id: Option<String>, error: &DomainError) -> Self {
        ServerMessage::Error(ErrorMessage {
            request_id,
            code: error.code,
            message: error.message.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyMessage {
    pub version: u32,
    #[serde(rename = "chatIDs")]
    pub chat_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionsUpdatedMessage {
    #[serde(rename = "requestID", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "chatIDs")]
    pub chat_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "requestID", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub code: ErrorCode,
    pub message: String,
}

/// A domain event as pushed to one connection.
///
/// `seq` is the connection's own delivery counter, not an event identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEventMessage {
    #[serde(rename = "type")]
    pub kind: DomainEventKind,
    pub seq: u64,
    /// Server time in Unix milliseconds.
    pub ts: i64,
    #[serde(rename = "chatID")]
    pub chat_id: String,
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Value>>,
}

impl DomainEventMessage {
    pub fn new(event: &DomainEvent, seq: u64, ts: i64, entries: Option<Vec<Value>>) -> Self {
        Self {
            kind: event.kind,
            seq,
            ts,
            chat_id: event.chat_id.clone(),
            ids: event.ids.clone(),
            entries,
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// A validated `subscriptions.set` command.
#[derive(Debug, Clone, PartialEq)]
pub struct SetSubscriptions {
    pub request_id: Option<String>,
    pub subscription: Subscription,
}

/// A client frame that failed validation.
///
/// Reported back to the sender; the connection stays open.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRejection {
    pub request_id: Option<String>,
    pub error: DomainError,
}

impl CommandRejection {
    fn payload(request_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            error: DomainError::invalid_payload(message),
        }
    }

    pub fn to_server_message(&self) -> ServerMessage {
        ServerMessage::error(self.request_id.clone(), &self.error)
    }
}

/// Rejection for a binary frame.
pub fn binary_frame_rejection() -> CommandRejection {
    CommandRejection::payload(None, NOT_AN_OBJECT)
}

/// Validates one text frame.
///
/// Checks run in a fixed order and the first failure wins. A string
/// `requestID` is echoed on every rejection after the frame is known to be
/// an object.
pub fn parse_command(text: &str) -> Result<SetSubscriptions, CommandRejection> {
    let payload: Value = serde_json::from_str(text)
        .map_err(|_| CommandRejection::payload(None, "Invalid JSON payload"))?;
    let Value::Object(object) = payload else {
        return Err(CommandRejection::payload(None, NOT_AN_OBJECT));
    };

    let request_id = object
        .get("requestID")
        .and_then(Value::as_str)
        .map(str::to_string);

    let Some(command) = object.get("type").and_then(Value::as_str) else {
        return Err(CommandRejection::payload(request_id, NOT_AN_OBJECT));
    };
    if command != SUBSCRIPTIONS_SET_COMMAND {
        return Err(CommandRejection {
            request_id,
            error: DomainError::invalid_command(format!("Unsupported command type: {}", command)),
        });
    }

    if has_unexpected_key(&object) {
        return Err(CommandRejection::payload(request_id, "Invalid subscriptions payload"));
    }
    if object.get("requestID").is_some_and(|v| !v.is_string()) {
        return Err(CommandRejection::payload(request_id, "requestID must be a string"));
    }

    let Some(chat_ids) = decode_chat_ids(object.get("chatIDs")) else {
        return Err(CommandRejection::payload(
            request_id,
            "chatIDs must be an array of strings",
        ));
    };
    match Subscription::from_chat_ids(chat_ids) {
        Ok(subscription) => Ok(SetSubscriptions {
            request_id,
            subscription,
        }),
        Err(e) => Err(CommandRejection::payload(request_id, e.to_string())),
    }
}

fn has_unexpected_key(object: &Map<String, Value>) -> bool {
    object
        .keys()
        .any(|key| !matches!(key.as_str(), "type" | "requestID" | "chatIDs"))
}

fn decode_chat_ids(raw: Option<&Value>) -> Option<Vec<&str>> {
    raw?.as_array()?.iter().map(Value::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejection(text: &str) -> CommandRejection {
        parse_command(text).unwrap_err()
    }

    #[test]
    fn ready_message_serializes_to_protocol_shape() {
        let json = serde_json::to_value(ServerMessage::ready()).unwrap();
        assert_eq!(json, json!({"type": "ready", "version": 1, "chatIDs": []}));
    }

    #[test]
    fn subscriptions_updated_omits_missing_request_id() {
        let sub = Subscription::from_chat_ids(["room1"]).unwrap();
        let json = serde_json::to_value(ServerMessage::subscriptions_updated(None, &sub)).unwrap();
        assert_eq!(json, json!({"type": "subscriptions.updated", "chatIDs": ["room1"]}));
    }

    #[test]
    fn error_message_carries_code_and_request_id() {
        let error = DomainError::invalid_command("Unsupported command type: ping");
        let json =
            serde_json::to_value(ServerMessage::error(Some("r1".to_string()), &error)).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "error",
                "requestID": "r1",
                "code": "INVALID_COMMAND",
                "message": "Unsupported command type: ping"
            })
        );
    }

    #[test]
    fn domain_event_message_includes_entries_only_when_present() {
        let event = DomainEvent::chat_upserted("!r1");
        let json = serde_json::to_value(DomainEventMessage::new(&event, 3, 1_700_000_000_000, None))
            .unwrap();
        assert_eq!(
            json,
            json!({"type": "chat.upserted", "seq": 3, "ts": 1_700_000_000_000i64,
                   "chatID": "!r1", "ids": ["!r1"]})
        );

        let with_entries = DomainEventMessage::new(&event, 4, 0, Some(vec![json!({"id": "$e"})]));
        let json = serde_json::to_value(with_entries).unwrap();
        assert_eq!(json["entries"], json!([{"id": "$e"}]));
    }

    #[test]
    fn valid_command_is_normalized() {
        let cmd = parse_command(
            r#"{"type":"subscriptions.set","requestID":"abc","chatIDs":["room2","room1","room1"]}"#,
        )
        .unwrap();
        assert_eq!(cmd.request_id.as_deref(), Some("abc"));
        assert_eq!(cmd.subscription.chat_ids(), vec!["room1", "room2"]);
    }

    #[test]
    fn empty_chat_ids_unsubscribe() {
        let cmd = parse_command(r#"{"type":"subscriptions.set","chatIDs":[]}"#).unwrap();
        assert_eq!(cmd.subscription, Subscription::None);
    }

    #[test]
    fn invalid_json_is_rejected() {
        let r = rejection("{not json");
        assert_eq!(r.error.code, ErrorCode::InvalidPayload);
        assert_eq!(r.error.message, "Invalid JSON payload");
    }

    #[test]
    fn non_object_is_rejected() {
        let r = rejection("[1,2]");
        assert_eq!(r.error.message, NOT_AN_OBJECT);
        assert_eq!(r.request_id, None);
    }

    #[test]
    fn missing_type_echoes_request_id() {
        let r = rejection(r#"{"requestID":"x","chatIDs":[]}"#);
        assert_eq!(r.error.message, NOT_AN_OBJECT);
        assert_eq!(r.request_id.as_deref(), Some("x"));

        let r = rejection(r#"{"type":7}"#);
        assert_eq!(r.error.message, NOT_AN_OBJECT);
    }

    #[test]
    fn unknown_type_is_invalid_command() {
        let r = rejection(r#"{"type":"foo"}"#);
        assert_eq!(r.error.code, ErrorCode::InvalidCommand);
        assert_eq!(r.error.message, "Unsupported command type: foo");
    }

    #[test]
    fn unexpected_key_is_rejected() {
        let r = rejection(r#"{"type":"subscriptions.set","chatIDs":[],"extra":1}"#);
        assert_eq!(r.error.message, "Invalid subscriptions payload");
    }

    #[test]
    fn non_string_request_id_is_rejected() {
        let r = rejection(r#"{"type":"subscriptions.set","requestID":5,"chatIDs":[]}"#);
        assert_eq!(r.error.message, "requestID must be a string");
        assert_eq!(r.request_id, None);
    }

    #[test]
    fn chat_ids_must_be_string_array() {
        for text in [
            r#"{"type":"subscriptions.set"}"#,
            r#"{"type":"subscriptions.set","chatIDs":"room1"}"#,
            r#"{"type":"subscriptions.set","chatIDs":["room1",2]}"#,
        ] {
            assert_eq!(rejection(text).error.message, "chatIDs must be an array of strings");
        }
    }

    #[test]
    fn wildcard_with_ids_is_rejected() {
        let r = rejection(
            r#"{"type":"subscriptions.set","requestID":"w","chatIDs":["*","room1"]}"#,
        );
        assert_eq!(r.error.code, ErrorCode::InvalidPayload);
        assert_eq!(r.error.message, "chatIDs cannot combine '*' with specific IDs");
        assert_eq!(r.request_id.as_deref(), Some("w"));
    }

    #[test]
    fn binary_frames_get_object_message() {
        assert_eq!(binary_frame_rejection().error.message, NOT_AN_OBJECT);
    }
}
