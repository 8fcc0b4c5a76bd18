//! Realtime hub configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Tunables of the WebSocket event hub.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of the sync batch queue; overflow is dropped
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// Largest accepted inbound frame
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_duplicate_debounce")]
    pub duplicate_debounce_ms: u64,

    #[serde(default = "default_fingerprint_retention")]
    pub fingerprint_retention_secs: u64,

    #[serde(default = "default_fingerprint_prune_interval")]
    pub fingerprint_prune_interval_secs: u64,
}

impl RealtimeConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn duplicate_debounce(&self) -> Duration {
        Duration::from_millis(self.duplicate_debounce_ms)
    }

    pub fn fingerprint_retention(&self) -> Duration {
        Duration::from_secs(self.fingerprint_retention_secs)
    }

    pub fn fingerprint_prune_interval(&self) -> Duration {
        Duration::from_secs(self.fingerprint_prune_interval_secs)
    }

    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("REALTIME__EVENT_QUEUE_CAPACITY", self.event_queue_capacity as u64),
            ("REALTIME__KEEPALIVE_INTERVAL_SECS", self.keepalive_interval_secs),
            ("REALTIME__PING_TIMEOUT_SECS", self.ping_timeout_secs),
            ("REALTIME__WRITE_TIMEOUT_SECS", self.write_timeout_secs),
            ("REALTIME__MAX_MESSAGE_BYTES", self.max_message_bytes as u64),
            ("REALTIME__DUPLICATE_DEBOUNCE_MS", self.duplicate_debounce_ms),
            ("REALTIME__FINGERPRINT_RETENTION_SECS", self.fingerprint_retention_secs),
            (
                "REALTIME__FINGERPRINT_PRUNE_INTERVAL_SECS",
                self.fingerprint_prune_interval_secs,
            ),
        ];
        if let Some(&(name, _)) = required.iter().find(|(_, value)| *value == 0) {
            return Err(ValidationError::ZeroValue(name));
        }
        if self.duplicate_debounce() >= self.fingerprint_retention() {
            return Err(ValidationError::DebounceExceedsRetention);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: default_event_queue_capacity(),
            keepalive_interval_secs: default_keepalive_interval(),
            ping_timeout_secs: default_ping_timeout(),
            write_timeout_secs: default_write_timeout(),
            max_message_bytes: default_max_message_bytes(),
            duplicate_debounce_ms: default_duplicate_debounce(),
            fingerprint_retention_secs: default_fingerprint_retention(),
            fingerprint_prune_interval_secs: default_fingerprint_prune_interval(),
        }
    }
}

fn default_event_queue_capacity() -> usize {
    512
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    5
}

fn default_write_timeout() -> u64 {
    5
}

fn default_max_message_bytes() -> usize {
    64 * 1024
}

fn default_duplicate_debounce() -> u64 {
    250
}

fn default_fingerprint_retention() -> u64 {
    30
}

fn default_fingerprint_prune_interval() -> u64 {
    5
}
