//! Live connection tracking and message delivery.
//!
//! This module provides:
//! - [`ConnectionId`] and [`ConnectionHandle`], the identity of a peer
//! - [`ConnectionSink`], the seam the transport implements to write frames
//! - [`ConnectionRegistry`], the ordered set of live connections
//! - [`Broadcaster`], targeted and fan-out delivery with failure cleanup

mod broadcast;
mod handle;
mod registry;

pub use broadcast::Broadcaster;
pub use handle::{ChannelSink, ConnectionHandle, ConnectionId, ConnectionSink};
pub use registry::ConnectionRegistry;
