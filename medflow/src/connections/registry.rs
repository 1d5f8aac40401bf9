//! Registry of live connections.

use super::handle::{ConnectionHandle, ConnectionId};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Ordered set of live connections, unique by id.
///
/// Registration order is kept so broadcasts visit peers in the order they
/// connected. Locks are never held across an `.await`; callers that need to
/// write to peers take a [`snapshot`](Self::snapshot) first.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<Vec<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection if its id is not already present.
    ///
    /// Returns the number of registered connections afterwards.
    pub fn register(&self, handle: ConnectionHandle) -> usize {
        let mut connections = self.connections.write();
        if connections.iter().any(|c| c.id() == handle.id()) {
            debug!(connection_id = %handle.id(), "Connection already registered");
        } else {
            info!(connection_id = %handle.id(), "Client connected");
            connections.push(handle);
        }
        connections.len()
    }

    /// Removes a connection if present.
    ///
    /// Returns the number of registered connections afterwards.
    pub fn deregister(&self, id: ConnectionId) -> usize {
        let mut connections = self.connections.write();
        let before = connections.len();
        connections.retain(|c| c.id() != id);
        if connections.len() < before {
            info!(connection_id = %id, remaining = connections.len(), "Client disconnected");
        }
        connections.len()
    }

    /// Returns true if the id is registered.
    #[must_use]
    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.read().iter().any(|c| c.id() == id)
    }

    /// Returns the handle for an id.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections.read().iter().find(|c| c.id() == id).cloned()
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn count(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Returns a point-in-time copy of all handles in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.read().clone()
    }

    /// Returns registered ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.read().iter().map(ConnectionHandle::id).collect()
    }
}
