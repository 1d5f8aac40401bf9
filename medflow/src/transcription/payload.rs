//! Outbound payloads.

use super::record::{StructuredRecord, Transcript};
use serde::Serialize;

/// The message sent back to a client after its fragment was processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Something went wrong; only the error text is sent.
    Error {
        /// The error text.
        error: String,
    },
    /// The fragment had a note: the transcript plus everything derived
    /// from it.
    Full {
        /// The parsed fragment.
        transcript: Transcript,
        /// The extracted record.
        structured_data: StructuredRecord,
        /// The rendered analysis.
        analysis: String,
    },
    /// The fragment had no note; it is echoed back as-is.
    TranscriptOnly {
        /// The parsed fragment.
        transcript: Transcript,
    },
    /// Nothing was parsed and no error is pending.
    Empty {
        /// Always `{}`.
        transcript: EmptyObject,
    },
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyObject {}

impl ResponsePayload {
    /// Picks the payload shape for what a run produced.
    ///
    /// A pending error wins. A transcript with a note and a structured record
    /// gets the full payload, with an empty analysis if none was written.
    #[must_use]
    pub fn from_parts(
        error: Option<String>,
        transcript: Option<Transcript>,
        structured: Option<StructuredRecord>,
        analysis: Option<String>,
    ) -> Self {
        if let Some(error) = error {
            return Self::Error { error };
        }
        match (transcript, structured) {
            (Some(transcript), Some(structured_data)) if transcript.has_note() => Self::Full {
                transcript,
                structured_data,
                analysis: analysis.unwrap_or_default(),
            },
            (Some(transcript), _) => Self::TranscriptOnly { transcript },
            (None, _) => Self::Empty {
                transcript: EmptyObject {},
            },
        }
    }

    /// Creates an error payload.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Returns true for the error shape.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Serializes the payload to JSON text.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
