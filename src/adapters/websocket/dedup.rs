//! Short-window suppression of repeated domain events.
//!
//! The chat client may report the same change in consecutive sync batches.
//! An event whose fingerprint was last seen less than the debounce window
//! ago is dropped. Every sighting refreshes the timestamp, so a steady
//! stream of identical events stays suppressed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupSettings {
    pub debounce: Duration,
    pub retention: Duration,
    pub prune_interval: Duration,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            retention: Duration::from_secs(30),
            prune_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Default)]
struct FingerprintCache {
    last_seen: HashMap<String, Instant>,
    last_prune: Option<Instant>,
}

/// Fingerprint cache with its own lock, independent of the registry.
pub struct DuplicateSuppressor {
    settings: DedupSettings,
    cache: Mutex<FingerprintCache>,
}

impl DuplicateSuppressor {
    pub fn new(settings: DedupSettings) -> Self {
        Self {
            settings,
            cache: Mutex::new(FingerprintCache::default()),
        }
    }

    /// Records a sighting and reports whether it is a duplicate.
    pub fn is_duplicate(&self, fingerprint: &str, now: Instant) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = cache.last_seen.insert(fingerprint.to_string(), now);
        self.prune(&mut cache, now);

        previous.is_some_and(|seen| now.saturating_duration_since(seen) < self.settings.debounce)
    }

    pub fn tracked(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_seen
            .len()
    }

    fn prune(&self, cache: &mut FingerprintCache, now: Instant) {
        if let Some(last) = cache.last_prune {
            if now.saturating_duration_since(last) < self.settings.prune_interval {
                return;
            }
        }
        cache.last_prune = Some(now);
        let retention = self.settings.retention;
        cache
            .last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) <= retention);
    }
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(DedupSettings::default())
    }
}
