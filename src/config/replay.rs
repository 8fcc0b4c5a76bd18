//! Replay feed configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Optional NDJSON file of client events fed into the hub at start-up.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReplayConfig {
    pub path: Option<PathBuf>,
}
