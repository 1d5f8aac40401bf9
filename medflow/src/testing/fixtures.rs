//! Builders for inbound messages.

use serde_json::{json, Value};

/// Builds the JSON a client sends for one dictation fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMessage {
    preview: Option<String>,
    note: Option<String>,
    listening: Option<bool>,
    no_match: Option<bool>,
    command: Option<String>,
}

impl Default for TranscriptMessage {
    fn default() -> Self {
        Self {
            preview: None,
            note: None,
            listening: Some(true),
            no_match: None,
            command: None,
        }
    }
}

impl TranscriptMessage {
    /// A listening fragment with no text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A listening fragment carrying a note.
    #[must_use]
    pub fn note(note: impl Into<String>) -> Self {
        Self::new().with_note(note)
    }

    /// Sets the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the preview.
    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Sets the listening flag.
    #[must_use]
    pub const fn listening(mut self, listening: bool) -> Self {
        self.listening = Some(listening);
        self
    }

    /// Leaves out the required listening flag.
    #[must_use]
    pub const fn without_listening(mut self) -> Self {
        self.listening = None;
        self
    }

    /// Sets the no-match flag.
    #[must_use]
    pub const fn no_match(mut self, no_match: bool) -> Self {
        self.no_match = Some(no_match);
        self
    }

    /// Sets the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Returns the message as a JSON value, omitting unset fields.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(preview) = &self.preview {
            map.insert("preview".into(), json!(preview));
        }
        if let Some(note) = &self.note {
            map.insert("note".into(), json!(note));
        }
        if let Some(listening) = self.listening {
            map.insert("listening".into(), json!(listening));
        }
        if let Some(no_match) = self.no_match {
            map.insert("noMatch".into(), json!(no_match));
        }
        if let Some(command) = &self.command {
            map.insert("command".into(), json!(command));
        }
        Value::Object(map)
    }

    /// Returns the message as JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
