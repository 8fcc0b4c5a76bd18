//! Mapping from stored Matrix events to wire messages.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::domain::foundation::Timestamp;
use crate::domain::sync::{event_type, RawEvent};

use super::types::{Attachment, AttachmentSize, Message, MessageType, Reaction};

const MSG_NOTICE: &str = "m.notice";
const MSG_IMAGE: &str = "m.image";
const MSG_VIDEO: &str = "m.video";
const MSG_AUDIO: &str = "m.audio";
const MSG_FILE: &str = "m.file";
const MSG_LOCATION: &str = "m.location";

/// Room-level lookups needed to render messages of one chat.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub account_id: &'a str,
    pub own_user_id: &'a str,
    /// Member user ID → display name.
    pub member_names: &'a HashMap<String, String>,
    /// Target event ID → aggregated reactions.
    pub reactions: &'a HashMap<String, Vec<Reaction>>,
}

/// Renders one stored event as a wire message.
///
/// Returns `None` for events that never surface as messages: redacted
/// events, edits (they update their target instead), and anything that is
/// not a message, sticker or reaction.
pub fn map_event_to_message(event: &RawEvent, ctx: &MessageContext<'_>) -> Option<Message> {
    if event.is_redacted() || event.is_edit() {
        return None;
    }
    let evt_type = event.effective_type();
    if !event_type::is_message_like(evt_type) {
        return None;
    }

    let content = event.effective_content();
    let sender_name = ctx
        .member_names
        .get(&event.sender)
        .cloned()
        .unwrap_or_else(|| event.sender.clone());

    let mut message = Message {
        id: event.event_id.clone(),
        chat_id: event.room_id.clone(),
        account_id: ctx.account_id.to_string(),
        sender_id: event.sender.clone(),
        sender_name,
        timestamp: Timestamp::from_unix_millis(event.timestamp).to_rfc3339(),
        sort_key: sort_key(event),
        is_sender: !ctx.own_user_id.is_empty() && event.sender == ctx.own_user_id,
        message_type: MessageType::Text,
        text: String::new(),
        linked_message_id: event.reply_to().map(str::to_string),
        attachments: Vec::new(),
        reactions: ctx
            .reactions
            .get(&event.event_id)
            .cloned()
            .unwrap_or_default(),
    };

    if evt_type == event_type::REACTION {
        message.message_type = MessageType::Reaction;
        message.text = str_at(content, "/m.relates_to/key").unwrap_or_default().to_string();
        if message.linked_message_id.is_none() {
            message.linked_message_id = str_at(content, "/m.relates_to/event_id")
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }
        return Some(message);
    }

    if !content.is_object() {
        return None;
    }
    let msgtype = str_at(content, "/msgtype").unwrap_or_default();
    message.message_type = message_type(evt_type, msgtype);
    message.text = str_at(content, "/body").unwrap_or_default().to_string();
    if message.text.is_empty() {
        if let Some(html) = event
            .local_content
            .as_ref()
            .and_then(|local| local.sanitized_html.as_deref())
        {
            message.text = html.to_string();
        }
    }
    if let Some(attachment) = attachment(content, evt_type) {
        message.attachments.push(attachment);
    }
    Some(message)
}

/// Aggregates reaction events targeting one message.
///
/// Redacted reactions and empty keys are skipped; each (sender, key) pair
/// counts once.
pub fn collect_reactions(events: &[RawEvent]) -> Vec<Reaction> {
    let mut seen = HashSet::new();
    let mut reactions = Vec::new();
    for event in events {
        if event.is_redacted() {
            continue;
        }
        let key = str_at(event.effective_content(), "/m.relates_to/key")
            .unwrap_or_default()
            .trim();
        if key.is_empty() {
            continue;
        }
        let id = format!("{}:{}", event.sender, key);
        if !seen.insert(id.clone()) {
            continue;
        }
        reactions.push(Reaction {
            id,
            reaction_key: key.to_string(),
            participant_id: event.sender.clone(),
            emoji: key.chars().count() <= 2,
        });
    }
    reactions
}

fn message_type(evt_type: &str, msgtype: &str) -> MessageType {
    if evt_type == event_type::STICKER {
        return MessageType::Sticker;
    }
    match msgtype {
        MSG_NOTICE => MessageType::Notice,
        MSG_IMAGE => MessageType::Image,
        MSG_VIDEO => MessageType::Video,
        MSG_AUDIO => MessageType::Audio,
        MSG_FILE => MessageType::File,
        MSG_LOCATION => MessageType::Location,
        _ => MessageType::Text,
    }
}

fn attachment(content: &Value, evt_type: &str) -> Option<Attachment> {
    let msgtype = if evt_type == event_type::STICKER {
        event_type::STICKER
    } else {
        str_at(content, "/msgtype").unwrap_or_default()
    };
    if !matches!(
        msgtype,
        MSG_IMAGE | MSG_VIDEO | MSG_AUDIO | MSG_FILE | event_type::STICKER
    ) {
        return None;
    }

    let uri = str_at(content, "/url")
        .filter(|u| !u.is_empty())
        .or_else(|| str_at(content, "/file/url"))
        .unwrap_or_default()
        .to_string();
    let file_name = str_at(content, "/filename")
        .or_else(|| str_at(content, "/body"))
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let info = content.get("info");
    let mime_type = info
        .and_then(|i| str_at(i, "/mimetype"))
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let width = info.and_then(|i| i.get("w")).and_then(Value::as_u64).unwrap_or(0);
    let height = info.and_then(|i| i.get("h")).and_then(Value::as_u64).unwrap_or(0);
    let duration_ms = info
        .and_then(|i| i.get("duration"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let is_gif = msgtype == MSG_IMAGE
        && mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("image/gif"));
    let attachment_type = match msgtype {
        MSG_IMAGE | event_type::STICKER => "img",
        MSG_VIDEO => "video",
        MSG_AUDIO => "audio",
        _ => "unknown",
    };

    Some(Attachment {
        id: uri.clone(),
        attachment_type: attachment_type.to_string(),
        src_url: uri,
        file_name,
        mime_type,
        file_size: info.and_then(|i| i.get("size")).and_then(Value::as_u64),
        size: (width > 0 || height > 0).then_some(AttachmentSize { width, height }),
        duration: (duration_ms > 0).then(|| duration_ms as f64 / 1000.0),
        poster_img: info
            .and_then(|i| str_at(i, "/thumbnail_url"))
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        is_gif,
        is_sticker: msgtype == event_type::STICKER,
    })
}

fn sort_key(event: &RawEvent) -> String {
    if event.timeline_rowid != 0 {
        event.timeline_rowid.to_string()
    } else if event.rowid != 0 {
        event.rowid.to_string()
    } else {
        event.timestamp.to_string()
    }
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}
