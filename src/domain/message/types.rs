//! Wire schema for hydrated messages (Beeper Desktop API shape).

use serde::{Deserialize, Serialize};

/// Kind of a message as shown to API consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Text,
    Notice,
    Image,
    Video,
    Audio,
    File,
    Location,
    Sticker,
    Reaction,
}

/// Pixel dimensions of visual media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSize {
    pub width: u64,
    pub height: u64,
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub attachment_type: String,
    #[serde(rename = "srcURL")]
    pub src_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<AttachmentSize>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_img: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_gif: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_sticker: bool,
}

/// One participant's reaction to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: String,
    pub reaction_key: String,
    #[serde(rename = "participantID")]
    pub participant_id: String,
    pub emoji: bool,
}

/// A message in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "chatID")]
    pub chat_id: String,
    #[serde(rename = "accountID")]
    pub account_id: String,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    pub sender_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub sort_key: String,
    pub is_sender: bool,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub text: String,
    #[serde(rename = "linkedMessageID", skip_serializing_if = "Option::is_none")]
    pub linked_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_api_field_names() {
        let message = Message {
            id: "$e1".to_string(),
            chat_id: "!r1".to_string(),
            account_id: "whatsapp".to_string(),
            sender_id: "@alice:beeper.com".to_string(),
            sender_name: "Alice".to_string(),
            timestamp: "2024-01-15T10:30:00Z".to_string(),
            sort_key: "42".to_string(),
            is_sender: false,
            message_type: MessageType::Text,
            text: "hello".to_string(),
            linked_message_id: Some("$e0".to_string()),
            attachments: vec![],
            reactions: vec![],
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["chatID"], "!r1");
        assert_eq!(json["accountID"], "whatsapp");
        assert_eq!(json["senderID"], "@alice:beeper.com");
        assert_eq!(json["linkedMessageID"], "$e0");
        assert_eq!(json["type"], "TEXT");
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn attachment_omits_false_flags() {
        let attachment = Attachment {
            id: "mxc://x/y".to_string(),
            attachment_type: "img".to_string(),
            src_url: "mxc://x/y".to_string(),
            file_name: None,
            mime_type: Some("image/gif".to_string()),
            file_size: None,
            size: None,
            duration: None,
            poster_img: None,
            is_gif: true,
            is_sticker: false,
        };

        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["srcURL"], "mxc://x/y");
        assert_eq!(json["isGif"], true);
        assert!(json.get("isSticker").is_none());
    }
}
