//! In-memory sync source implementing `SyncSource`.
//!
//! Stands in for the chat client's event buffer: whatever is published is
//! delivered synchronously to every live subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::sync::ClientEvent;
use crate::ports::{SyncCallback, SyncSource, SyncSourceError, SyncSubscription};

type Subscribers = Arc<Mutex<HashMap<u64, SyncCallback>>>;

/// Synchronous in-process event source.
pub struct InMemorySyncSource {
    subscribers: Subscribers,
    next_id: AtomicU64,
    attempts: AtomicUsize,
    failure: Mutex<Option<SyncSourceError>>,
}

impl InMemorySyncSource {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            attempts: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Makes every following `subscribe` call fail with `error`.
    pub fn fail_with(&self, error: SyncSourceError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Delivers `event` to all current subscribers, returning how many saw it.
    pub fn publish(&self, event: ClientEvent) -> usize {
        // Snapshot so callbacks may subscribe or unsubscribe re-entrantly.
        let callbacks: Vec<SyncCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in &callbacks {
            callback(event.clone());
        }
        callbacks.len()
    }

    /// Number of `subscribe` calls, successful or not.
    pub fn subscribe_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for InMemorySyncSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSource for InMemorySyncSource {
    fn subscribe(&self, callback: SyncCallback) -> Result<SyncSubscription, SyncSourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);

        let subscribers = Arc::clone(&self.subscribers);
        Ok(SyncSubscription::new(move || {
            subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sync::SyncBatch;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback() -> (SyncCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: SyncCallback = Arc::new(move |_event| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    #[test]
    fn published_events_reach_subscribers() {
        let source = InMemorySyncSource::new();
        let (callback, count) = counting_callback();
        let _handle = source.subscribe(callback).unwrap();

        assert_eq!(source.publish(ClientEvent::from(SyncBatch::default())), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let source = InMemorySyncSource::new();
        let (callback, count) = counting_callback();
        let handle = source.subscribe(callback).unwrap();
        assert_eq!(source.subscriber_count(), 1);

        handle.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.publish(ClientEvent::from(SyncBatch::default())), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn forced_failure_is_returned() {
        let source = InMemorySyncSource::new();
        source.fail_with(SyncSourceError::NotInitialized);
        let (callback, _) = counting_callback();

        assert_eq!(
            source.subscribe(callback).unwrap_err(),
            SyncSourceError::NotInitialized
        );
        assert_eq!(source.subscribe_attempts(), 1);
        assert_eq!(source.subscriber_count(), 0);
    }
}
