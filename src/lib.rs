//! Beeper Realtime - WebSocket event hub for the Beeper Desktop API
//!
//! This crate turns the sync stream of a Matrix chat client into coarse
//! chat and message change events and pushes them to subscribed WebSocket
//! clients.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
