//! Transcript and structured record types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One dictation fragment as sent by a client.
///
/// Only `listening` is required. Missing or `null` text fields read as
/// empty, `noMatch` defaults to false and `command` is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Interim text still being recognized.
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: String,
    /// Final text of the fragment.
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    /// Whether the client's recognizer is currently listening.
    pub listening: bool,
    /// Whether the recognizer failed to match the last utterance.
    #[serde(rename = "noMatch", default, deserialize_with = "null_as_default")]
    pub no_match: bool,
    /// Voice command recognized in the fragment, if any.
    #[serde(default)]
    pub command: Option<String>,
}

impl Transcript {
    /// Creates a transcript with the given note.
    #[must_use]
    pub fn new(note: impl Into<String>, listening: bool) -> Self {
        Self {
            note: note.into(),
            listening,
            ..Self::default()
        }
    }

    /// Sets the preview text.
    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    /// Sets the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Returns true if the note carries text worth structuring.
    #[must_use]
    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Clinical facts extracted from a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Symptoms, in lexicon order.
    pub symptoms: Vec<String>,
    /// Diagnoses, in lexicon order.
    pub diagnoses: Vec<String>,
    /// Medications, in lexicon order.
    pub medications: Vec<String>,
    /// Procedures, in lexicon order.
    pub procedures: Vec<String>,
    /// Vital sign name to free-text value.
    pub vital_signs: BTreeMap<String, String>,
    /// The note the record was derived from.
    pub notes: String,
}

impl StructuredRecord {
    /// Creates an empty record for a note.
    #[must_use]
    pub fn for_note(note: impl Into<String>) -> Self {
        Self {
            notes: note.into(),
            ..Self::default()
        }
    }

    /// Returns true if nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
            && self.diagnoses.is_empty()
            && self.medications.is_empty()
            && self.procedures.is_empty()
            && self.vital_signs.is_empty()
    }
}
