//! Batch-created events and the sinks that carry them.
//!
//! Each sealed and written batch produces one [`BatchEvent`], serialized as
//! a JSON object with exactly two keys. Delivery is fire-and-forget: sinks
//! either accept the payload within a bounded time or fail, and the
//! publisher never retries on its own.

pub mod tcp;

pub use tcp::TcpQueueSink;

use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Notification that a batch file is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub file_path: String,
    pub event_type: String,
}

impl BatchEvent {
    pub fn new(file_path: &Path, event_type: impl Into<String>) -> Self {
        BatchEvent {
            file_path: file_path.to_string_lossy().into_owned(),
            event_type: event_type.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, PublishError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("event queue is full")]
    Full,

    #[error("event queue consumer is gone")]
    Disconnected,

    #[error("queue at {endpoint} unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write to queue at {endpoint} failed: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<&PublishError> for sampler_common::Error {
    fn from(err: &PublishError) -> Self {
        match err {
            PublishError::Unreachable { .. } => {
                sampler_common::Error::QueueUnavailable(err.to_string())
            }
            _ => sampler_common::Error::Publish(err.to_string()),
        }
    }
}

/// Outbound channel for serialized events.
pub trait EventSink: Send {
    /// Enqueue one payload. Must not block unboundedly.
    fn send(&mut self, payload: &str) -> Result<(), PublishError>;

    fn describe(&self) -> String;
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn send(&mut self, payload: &str) -> Result<(), PublishError> {
        (**self).send(payload)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// In-process sink over a bounded channel.
pub struct ChannelSink {
    tx: SyncSender<String>,
    capacity: usize,
}

impl ChannelSink {
    /// Returns the sink and the consumer end.
    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (ChannelSink { tx, capacity }, rx)
    }
}

impl EventSink for ChannelSink {
    fn send(&mut self, payload: &str) -> Result<(), PublishError> {
        self.tx.try_send(payload.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::Full,
            TrySendError::Disconnected(_) => PublishError::Disconnected,
        })
    }

    fn describe(&self) -> String {
        format!("channel(capacity={})", self.capacity)
    }
}

/// Builds events for one event type and hands them to a sink.
pub struct EventPublisher {
    sink: Box<dyn EventSink>,
    event_type: String,
}

impl EventPublisher {
    pub fn new(sink: impl EventSink + 'static, event_type: impl Into<String>) -> Self {
        EventPublisher {
            sink: Box::new(sink),
            event_type: event_type.into(),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn describe(&self) -> String {
        self.sink.describe()
    }

    /// Announce `path`. Returns the event that was sent.
    pub fn publish(&mut self, path: &Path) -> Result<BatchEvent, PublishError> {
        let event = BatchEvent::new(path, self.event_type.as_str());
        let payload = event.to_json()?;
        self.sink.send(&payload)?;
        debug!(path = %event.file_path, sink = %self.sink.describe(), "event published");
        Ok(event)
    }
}
