//! Per-message pipeline context.
//!
//! A [`TranscriptContext`] is created for each inbound message, passed by
//! `&mut` through one flow run and dropped once the reply has been handed to
//! the broadcaster. Every field a stage may read or write has its own typed
//! slot.

use crate::connections::ConnectionId;
use crate::transcription::{StructuredRecord, Transcript};

/// Mutable state for one run of the transcription flow.
#[derive(Debug, Clone, Default)]
pub struct TranscriptContext {
    /// The inbound text as received.
    raw_message: Option<String>,
    /// The connection that sent the message.
    origin: Option<ConnectionId>,
    /// Written by ingest.
    transcript: Option<Transcript>,
    /// Written by structure.
    structured: Option<StructuredRecord>,
    /// Written by analyze.
    analysis: Option<String>,
    /// Pending error, cleared by respond.
    error: Option<String>,
    /// Serialized reply, written by respond.
    response: Option<String>,
    /// Set once `response` holds a reply that should be delivered.
    response_ready: bool,
}

impl TranscriptContext {
    /// Creates a context for an inbound message.
    #[must_use]
    pub fn new(raw_message: impl Into<String>) -> Self {
        Self {
            raw_message: Some(raw_message.into()),
            ..Self::default()
        }
    }

    /// Sets the originating connection.
    #[must_use]
    pub const fn with_origin(mut self, origin: ConnectionId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the inbound text.
    #[must_use]
    pub fn raw_message(&self) -> Option<&str> {
        self.raw_message.as_deref()
    }

    /// Returns the originating connection.
    #[must_use]
    pub const fn origin(&self) -> Option<ConnectionId> {
        self.origin
    }

    /// Returns the parsed transcript.
    #[must_use]
    pub const fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Returns the structured record.
    #[must_use]
    pub const fn structured(&self) -> Option<&StructuredRecord> {
        self.structured.as_ref()
    }

    /// Returns the analysis text.
    #[must_use]
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    /// Returns the pending error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the serialized reply.
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Returns true once a reply is ready for delivery.
    #[must_use]
    pub const fn is_response_ready(&self) -> bool {
        self.response_ready
    }

    /// Stores the parsed transcript.
    pub fn set_transcript(&mut self, transcript: Transcript) {
        self.transcript = Some(transcript);
    }

    /// Stores the structured record.
    pub fn set_structured(&mut self, record: StructuredRecord) {
        self.structured = Some(record);
    }

    /// Stores the analysis text.
    pub fn set_analysis(&mut self, analysis: impl Into<String>) {
        self.analysis = Some(analysis.into());
    }

    /// Records an error for the respond stage to report.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Drops the pending error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Stores the reply and marks it ready.
    pub fn set_response(&mut self, response: impl Into<String>) {
        self.response = Some(response.into());
        self.response_ready = true;
    }

    /// Takes the reply if one is ready, leaving the context without one.
    pub fn take_response(&mut self) -> Option<String> {
        if !self.response_ready {
            return None;
        }
        self.response_ready = false;
        self.response.take()
    }
}
