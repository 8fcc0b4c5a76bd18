//! Message module - the wire representation of chat messages.

mod mapping;
mod types;

pub use mapping::{collect_reactions, map_event_to_message, MessageContext};
pub use types::{Attachment, AttachmentSize, Message, MessageType, Reaction};
