//! Sync module - the chat client's view of one sync cycle.

mod batch;
pub mod event_type;

pub use batch::{
    ClientEvent, LocalContent, RawClientEvent, RawEvent, RoomSync, SyncBatch,
    SYNC_COMPLETE_COMMAND,
};
