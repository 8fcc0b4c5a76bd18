//! Matrix event types and relation types the bridge reacts to.

pub const MESSAGE: &str = "m.room.message";
pub const STICKER: &str = "m.sticker";
pub const REACTION: &str = "m.reaction";
pub const REDACTION: &str = "m.room.redaction";

pub const MEMBER: &str = "m.room.member";
pub const ROOM_NAME: &str = "m.room.name";
pub const ROOM_AVATAR: &str = "m.room.avatar";
pub const TOPIC: &str = "m.room.topic";

/// Relation type of an edit.
pub const REL_REPLACE: &str = "m.replace";

/// Event types rendered as messages on the wire.
pub fn is_message_like(event_type: &str) -> bool {
    matches!(event_type, MESSAGE | STICKER | REACTION)
}

/// State event types that change how a chat is presented.
pub fn is_chat_state(event_type: &str) -> bool {
    matches!(event_type, MEMBER | ROOM_NAME | ROOM_AVATAR | TOPIC)
}
