//! SyncSource port - Interface to the chat client's event stream.
//!
//! The chat client owns sync. It pushes every decoded client event to the
//! registered callbacks; the realtime hub is one such consumer.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::sync::ClientEvent;

/// Callback invoked for every event the chat client emits.
///
/// Runs on the chat client's thread and must not block.
pub type SyncCallback = Arc<dyn Fn(ClientEvent) + Send + Sync>;

/// Errors raised while subscribing to the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncSourceError {
    #[error("Chat client is not initialized")]
    NotInitialized,

    #[error("Chat client rejected subscription: {0}")]
    Rejected(String),
}

/// Port for attaching to the chat client's event stream.
pub trait SyncSource: Send + Sync {
    /// Registers `callback`; events flow until the returned handle is
    /// unsubscribed or dropped.
    fn subscribe(&self, callback: SyncCallback) -> Result<SyncSubscription, SyncSourceError>;
}

/// Handle to an active subscription.
pub struct SyncSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SyncSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops event delivery. Idempotent with dropping the handle.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SyncSubscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for SyncSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
