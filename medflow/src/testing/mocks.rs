//! Mock connection sinks for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::connections::ConnectionSink;
use crate::errors::TransportError;

/// A sink that records every message written to it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Returns the messages parsed as JSON, skipping any that are not.
    #[must_use]
    pub fn json_messages(&self) -> Vec<serde_json::Value> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Returns the number of messages received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Returns true if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Forgets recorded messages.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[async_trait]
impl ConnectionSink for RecordingSink {
    async fn send_text(&self, message: Arc<str>) -> Result<(), TransportError> {
        self.messages.lock().push(message.to_string());
        Ok(())
    }
}

/// A sink whose writes always fail.
#[derive(Debug, Clone)]
pub struct FailingSink {
    error: TransportError,
}

impl FailingSink {
    /// Fails as if the peer had gone away.
    #[must_use]
    pub const fn closed() -> Self {
        Self {
            error: TransportError::Closed,
        }
    }

    /// Fails with a write error.
    #[must_use]
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self {
            error: TransportError::WriteFailed(reason.into()),
        }
    }
}

#[async_trait]
impl ConnectionSink for FailingSink {
    async fn send_text(&self, _message: Arc<str>) -> Result<(), TransportError> {
        Err(self.error.clone())
    }
}
