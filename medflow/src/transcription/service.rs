//! Connection lifecycle and per-message processing.

use super::config::FlowConfig;
use super::flow::build_transcription_flow;
use super::stages::DATA_PARAM;
use crate::connections::{
    Broadcaster, ConnectionHandle, ConnectionId, ConnectionRegistry, ConnectionSink,
};
use crate::context::TranscriptContext;
use crate::errors::FlowBuildError;
use crate::observability::emit_flow_run;
use crate::pipeline::{FlowGraph, FlowParams};
use std::sync::Arc;
use tracing::{info, warn};

/// Message broadcast to the remaining clients when one disconnects.
pub const DISCONNECT_NOTICE: &str = "Client disconnected";

/// What happened to the reply for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The reply reached the sender.
    Delivered,
    /// A reply was produced but the sender could not be reached.
    Undelivered,
    /// The run finished without producing a reply.
    NoReply,
}

/// Ties the transcription flow to the connection registry.
///
/// The transport calls [`connect`](Self::connect) when a peer arrives,
/// [`handle_message`](Self::handle_message) for each text frame, and
/// [`disconnect`](Self::disconnect) or
/// [`connection_error`](Self::connection_error) when the peer goes away.
#[derive(Debug, Clone)]
pub struct TranscriptionService {
    flow: Arc<FlowGraph<TranscriptContext>>,
    broadcaster: Broadcaster,
}

impl TranscriptionService {
    /// Creates a service from a built flow and a registry.
    #[must_use]
    pub fn new(flow: Arc<FlowGraph<TranscriptContext>>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            flow,
            broadcaster: Broadcaster::new(registry),
        }
    }

    /// Builds the transcription flow from `config` and wraps it in a service.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowBuildError`] if the flow fails validation.
    pub fn from_config(
        config: &FlowConfig,
        registry: Arc<ConnectionRegistry>,
    ) -> Result<Self, FlowBuildError> {
        let flow = build_transcription_flow(config)?;
        Ok(Self::new(Arc::new(flow), registry))
    }

    /// Returns the flow.
    #[must_use]
    pub const fn flow(&self) -> &Arc<FlowGraph<TranscriptContext>> {
        &self.flow
    }

    /// Returns the broadcaster.
    #[must_use]
    pub const fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.broadcaster.registry()
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry().count()
    }

    /// Registers a new peer reached through `sink`.
    ///
    /// Returns its handle and the number of live connections.
    pub fn connect(&self, sink: Arc<dyn ConnectionSink>) -> (ConnectionHandle, usize) {
        let handle = ConnectionHandle::new(sink);
        let count = self.registry().register(handle.clone());
        info!(connection_id = %handle.id(), total = count, "Connection registered");
        (handle, count)
    }

    /// Runs one inbound message through the flow and replies to its sender.
    pub async fn handle_message(&self, origin: ConnectionId, raw: &str) -> MessageOutcome {
        let mut ctx = TranscriptContext::new(raw).with_origin(origin);
        let params = FlowParams::new().with(DATA_PARAM, serde_json::Value::String(raw.to_string()));
        let trace = self.flow.run(&mut ctx, &params);

        emit_flow_run(&trace, Some(&origin.to_string()));

        let Some(response) = ctx.take_response() else {
            warn!(
                connection_id = %origin,
                termination = ?trace.termination,
                "Flow finished without a reply"
            );
            return MessageOutcome::NoReply;
        };

        if self.broadcaster.send_to(origin, response).await {
            MessageOutcome::Delivered
        } else {
            MessageOutcome::Undelivered
        }
    }

    /// Deregisters a peer that closed normally.
    ///
    /// The remaining peers are told a client left. Returns the number of
    /// live connections afterwards.
    pub async fn disconnect(&self, id: ConnectionId) -> usize {
        let remaining = self.registry().deregister(id);
        if remaining > 0 {
            self.broadcaster
                .broadcast_json(&serde_json::json!({ "message": DISCONNECT_NOTICE }))
                .await;
        }
        remaining
    }

    /// Deregisters a peer whose connection failed.
    ///
    /// The failure reason is broadcast to the remaining peers as an error.
    /// Returns the number of live connections afterwards.
    pub async fn connection_error(&self, id: ConnectionId, reason: &str) -> usize {
        warn!(connection_id = %id, error = reason, "Connection failed");
        let remaining = self.registry().deregister(id);
        if remaining > 0 {
            self.broadcaster
                .broadcast_json(&serde_json::json!({ "error": reason }))
                .await;
        }
        remaining
    }
}
