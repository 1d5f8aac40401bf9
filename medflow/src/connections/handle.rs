//! Connection identity and the outbound write seam.

use crate::errors::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Writes text frames to one peer.
///
/// Implemented by the transport. A returned error means the peer should be
/// treated as gone.
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Sends one text message.
    async fn send_text(&self, message: Arc<str>) -> Result<(), TransportError>;
}

/// A sink that forwards messages into a bounded channel.
///
/// The receiving half is typically drained by a task that owns the socket's
/// write half. Sends never wait: a full queue is reported as
/// [`TransportError::QueueFull`], so one stalled peer cannot hold up
/// delivery to the others.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelSink {
    /// Creates a sink and the receiver it feeds.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Wraps an existing sender.
    #[must_use]
    pub const fn from_sender(tx: mpsc::Sender<Arc<str>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ConnectionSink for ChannelSink {
    async fn send_text(&self, message: Arc<str>) -> Result<(), TransportError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// A registered connection: its id plus the sink that reaches it.
///
/// Handles compare by id only.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sink: Arc<dyn ConnectionSink>,
}

impl ConnectionHandle {
    /// Creates a handle with a fresh id.
    #[must_use]
    pub fn new(sink: Arc<dyn ConnectionSink>) -> Self {
        Self::with_id(ConnectionId::new(), sink)
    }

    /// Creates a handle with a known id.
    #[must_use]
    pub fn with_id(id: ConnectionId, sink: Arc<dyn ConnectionSink>) -> Self {
        Self { id, sink }
    }

    /// Returns the connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one text message to the peer.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the write fails.
    pub async fn send_text(&self, message: Arc<str>) -> Result<(), TransportError> {
        self.sink.send_text(message).await
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
