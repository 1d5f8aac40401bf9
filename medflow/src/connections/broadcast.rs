//! Targeted and fan-out delivery over the connection registry.

use super::handle::ConnectionId;
use super::registry::ConnectionRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Delivers messages to registered connections.
///
/// Delivery is best-effort: a failed write deregisters the peer and is never
/// retried.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Creates a broadcaster over a registry.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Sends a message to one connection.
    ///
    /// Returns false if the id is not registered, or if the write failed, in
    /// which case the connection is deregistered.
    pub async fn send_to(&self, id: ConnectionId, message: impl Into<Arc<str>>) -> bool {
        let Some(handle) = self.registry.get(id) else {
            debug!(connection_id = %id, "Dropping message for unknown connection");
            return false;
        };

        match handle.send_text(message.into()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(connection_id = %id, error = %e, "Send failed; removing connection");
                self.registry.deregister(id);
                false
            }
        }
    }

    /// Sends a message to every registered connection.
    ///
    /// Works on a snapshot taken at the start, in registration order.
    /// Connections that leave before their turn are skipped, and a failed
    /// write does not stop delivery to the rest. Failed peers are
    /// deregistered after the loop. Returns the number of successful sends.
    pub async fn broadcast_all(&self, message: impl Into<Arc<str>>) -> usize {
        let message = message.into();
        let snapshot = self.registry.snapshot();
        let mut delivered = 0;
        let mut failed = Vec::new();

        for handle in &snapshot {
            if !self.registry.is_registered(handle.id()) {
                debug!(connection_id = %handle.id(), "Skipping connection that left mid-broadcast");
                continue;
            }
            match handle.send_text(Arc::clone(&message)).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(connection_id = %handle.id(), error = %e, "Broadcast send failed");
                    failed.push(handle.id());
                }
            }
        }

        for id in &failed {
            self.registry.deregister(*id);
        }

        debug!(
            recipients = snapshot.len(),
            delivered,
            failed = failed.len(),
            "Broadcast complete"
        );
        delivered
    }

    /// Serializes a value once and broadcasts it.
    ///
    /// A value that fails to serialize is logged and reaches nobody.
    pub async fn broadcast_json<T>(&self, value: &T) -> usize
    where
        T: Serialize + ?Sized + Sync,
    {
        match serde_json::to_string(value) {
            Ok(json) => self.broadcast_all(json).await,
            Err(e) => {
                warn!(error = %e, "Failed to serialize broadcast payload");
                0
            }
        }
    }
}
