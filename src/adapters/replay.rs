//! Replays recorded client events into the in-memory adapters.
//!
//! Input is newline-delimited JSON, one `{"command": ..., "data": ...}`
//! payload per line. Sync batches are folded into the chat store before
//! they are published, so hydration sees the same state a live client
//! would have.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::adapters::memory::{InMemoryChatStore, InMemorySyncSource};
use crate::domain::sync::{ClientEvent, RawClientEvent};

/// Replay failures. Malformed lines are skipped, not reported here.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay input: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub published: usize,
    pub sync_batches: usize,
    pub skipped: usize,
}

/// Feeds recorded client events into a store and sync source.
pub struct ReplayFeed {
    store: Arc<InMemoryChatStore>,
    source: Arc<InMemorySyncSource>,
}

impl ReplayFeed {
    pub fn new(store: Arc<InMemoryChatStore>, source: Arc<InMemorySyncSource>) -> Self {
        Self { store, source }
    }

    /// Replays an NDJSON file.
    pub async fn replay_file(&self, path: impl AsRef<Path>) -> Result<ReplayStats, ReplayError> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        tracing::info!(path = %path.display(), "Replaying client events");
        self.replay(BufReader::new(file)).await
    }

    /// Replays NDJSON lines from `reader` until EOF.
    pub async fn replay<R>(&self, reader: R) -> Result<ReplayStats, ReplayError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ReplayStats::default();
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let event = match serde_json::from_str::<RawClientEvent>(line)
                .and_then(ClientEvent::try_from)
            {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "Skipping malformed client event");
                    stats.skipped += 1;
                    continue;
                }
            };

            if let Some(batch) = event.as_sync_batch() {
                self.store.apply_batch(batch);
                stats.sync_batches += 1;
            }
            self.source.publish(event);
            stats.published += 1;
        }

        tracing::info!(
            published = stats.published,
            sync_batches = stats.sync_batches,
            skipped = stats.skipped,
            "Replay finished"
        );
        Ok(stats)
    }
}
