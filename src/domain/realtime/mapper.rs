//! Derivation of domain events from one sync batch.
//!
//! # Rules
//!
//! ```text
//! left room                        → chat.deleted  [chatID]
//! meta / state / account data /
//!   timeline changed               → chat.upserted [chatID]
//! m.room.redaction → $target       → message.deleted  $target
//! event with redacted_by           → message.deleted  own ID
//! m.room.message / m.sticker       → chat.upserted + message.upserted own ID
//! m.reaction → $target             → chat.upserted + message.upserted $target
//! m.replace edit → $original       → chat.upserted + message.upserted $original
//! member / name / avatar / topic   → chat.upserted
//! ```
//!
//! An ID that is both upserted and deleted within one batch is only
//! reported as deleted.

use std::collections::BTreeSet;

use crate::domain::sync::{event_type, RawEvent, RoomSync, SyncBatch};

use super::domain_event::{DomainEvent, DomainEventKind};

/// Maps one sync batch to the domain events it implies.
///
/// Deterministic: left rooms first, then touched rooms in room-ID order,
/// each emitting chat → message upsert → message delete.
pub fn map_sync_batch(batch: &SyncBatch) -> Vec<DomainEvent> {
    let mut output = Vec::with_capacity(batch.rooms.len() * 2 + batch.left_rooms.len());

    for left_room in &batch.left_rooms {
        let chat_id = left_room.trim();
        if !chat_id.is_empty() {
            output.push(DomainEvent::chat_deleted(chat_id));
        }
    }

    for (room_id, room) in &batch.rooms {
        let chat_id = room_id.trim();
        if chat_id.is_empty() {
            continue;
        }
        map_room(chat_id, room, &mut output);
    }

    output
}

#[derive(Default)]
struct RoomChanges {
    touched: bool,
    upserted: BTreeSet<String>,
    deleted: BTreeSet<String>,
}

impl RoomChanges {
    fn classify(&mut self, event: &RawEvent) {
        let evt_type = event.effective_type();

        if evt_type == event_type::REDACTION {
            if let Some(target) = event.relates_to() {
                self.deleted.insert(target.to_string());
            }
        } else if event.is_redacted() {
            let id = event.event_id.trim();
            if !id.is_empty() {
                self.deleted.insert(id.to_string());
            }
        } else if event_type::is_message_like(evt_type) {
            self.touched = true;
            if let Some(target) = upsert_target(event, evt_type) {
                self.upserted.insert(target.to_string());
            }
        } else if event_type::is_chat_state(evt_type) {
            self.touched = true;
        }
    }
}

fn upsert_target<'a>(event: &'a RawEvent, evt_type: &str) -> Option<&'a str> {
    let redirect = evt_type == event_type::REACTION || event.is_edit();
    let target = match event.relates_to() {
        Some(related) if redirect => related,
        _ => event.event_id.trim(),
    };
    (!target.is_empty()).then_some(target)
}

fn map_room(chat_id: &str, room: &RoomSync, output: &mut Vec<DomainEvent>) {
    let mut changes = RoomChanges {
        touched: room.metadata_changed()
            || room.state_changed()
            || room.account_data_changed()
            || room.timeline_changed(),
        ..Default::default()
    };

    for event in &room.events {
        changes.classify(event);
    }

    let RoomChanges {
        touched,
        mut upserted,
        deleted,
    } = changes;
    upserted.retain(|id| !deleted.contains(id));

    if touched {
        output.push(DomainEvent::chat_upserted(chat_id));
    }
    if !upserted.is_empty() {
        output.push(DomainEvent::for_messages(
            DomainEventKind::MessageUpserted,
            chat_id,
            upserted,
        ));
    }
    if !deleted.is_empty() {
        output.push(DomainEvent::for_messages(
            DomainEventKind::MessageDeleted,
            chat_id,
            deleted,
        ));
    }
}
