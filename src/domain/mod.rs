//! Domain layer containing the bridge's pure logic and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `sync` - Sync batches and raw events as the chat client reports them
//! - `message` - Wire messages and their mapping from raw events
//! - `realtime` - Domain events, the sync mapper, subscriptions, fingerprints

pub mod foundation;
pub mod message;
pub mod realtime;
pub mod sync;
