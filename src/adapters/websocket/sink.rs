//! Outbound half of a WebSocket connection.
//!
//! The hub only ever writes text frames, pings and a final close, so the
//! transport is reduced to those three operations.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use thiserror::Error;

/// Transport-level write failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Connection closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Write side of a client connection.
#[async_trait]
pub trait ClientSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), SinkError>;

    async fn ping(&mut self) -> Result<(), SinkError>;

    /// Sends a close frame and shuts the sink down.
    async fn close(&mut self) -> Result<(), SinkError>;
}

#[async_trait]
impl ClientSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<(), SinkError> {
        SinkExt::send(self, Message::Text(text)).await.map_err(transport)
    }

    async fn ping(&mut self) -> Result<(), SinkError> {
        SinkExt::send(self, Message::Ping(Vec::new())).await.map_err(transport)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        SinkExt::send(self, Message::Close(None)).await.map_err(transport)?;
        SinkExt::close(self).await.map_err(transport)
    }
}

fn transport(error: axum::Error) -> SinkError {
    SinkError::Transport(error.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Channel-backed sink for hub tests.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Frame {
        Text(serde_json::Value),
        Ping,
        Close,
    }

    /// Switches a [`RecordingSink`] into failure or stall mode.
    #[derive(Clone, Default)]
    pub struct SinkControl {
        fail: Arc<AtomicBool>,
        stall: Arc<AtomicBool>,
    }

    impl SinkControl {
        pub fn fail(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        pub fn stall(&self) {
            self.stall.store(true, Ordering::SeqCst);
        }
    }

    pub struct RecordingSink {
        frames: mpsc::UnboundedSender<Frame>,
        control: SinkControl,
    }

    pub fn recording_sink() -> (RecordingSink, mpsc::UnboundedReceiver<Frame>, SinkControl) {
        let (tx, rx) = mpsc::unbounded_channel();
        let control = SinkControl::default();
        (
            RecordingSink {
                frames: tx,
                control: control.clone(),
            },
            rx,
            control,
        )
    }

    impl RecordingSink {
        async fn push(&mut self, frame: Frame) -> Result<(), SinkError> {
            if self.control.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.control.fail.load(Ordering::SeqCst) {
                return Err(SinkError::Transport("broken pipe".to_string()));
            }
            self.frames.send(frame).map_err(|_| SinkError::Closed)
        }
    }

    #[async_trait]
    impl ClientSink for RecordingSink {
        async fn send_text(&mut self, text: String) -> Result<(), SinkError> {
            let value = serde_json::from_str(&text)
                .map_err(|e| SinkError::Transport(e.to_string()))?;
            self.push(Frame::Text(value)).await
        }

        async fn ping(&mut self) -> Result<(), SinkError> {
            self.push(Frame::Ping).await
        }

        async fn close(&mut self) -> Result<(), SinkError> {
            // Close frames are recorded even on a failed transport.
            self.frames.send(Frame::Close).map_err(|_| SinkError::Closed)
        }
    }
}
