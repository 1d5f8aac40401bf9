//! Configuration for the transcription flow.

use super::lexicon::Lexicon;
use crate::pipeline::DEFAULT_MAX_STEPS;
use serde::{Deserialize, Serialize};

/// Settings for building the transcription flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Maximum stage invocations per message.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Longest note, in characters, the structure stage accepts.
    #[serde(default = "default_max_note_chars")]
    pub max_note_chars: usize,
    /// Vocabulary for extracting clinical terms.
    #[serde(default)]
    pub lexicon: Lexicon,
}

const fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

const fn default_max_note_chars() -> usize {
    10_000
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_note_chars: default_max_note_chars(),
            lexicon: Lexicon::default(),
        }
    }
}

impl FlowConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step limit.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the note length limit.
    #[must_use]
    pub const fn with_max_note_chars(mut self, max_note_chars: usize) -> Self {
        self.max_note_chars = max_note_chars;
        self
    }

    /// Replaces the lexicon.
    #[must_use]
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::new();
        assert_eq!(config.max_steps, 64);
        assert_eq!(config.max_note_chars, 10_000);
        assert_eq!(config.lexicon, Lexicon::portuguese());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FlowConfig = serde_json::from_str(r#"{"max_note_chars": 200}"#).unwrap();
        assert_eq!(config.max_note_chars, 200);
        assert_eq!(config.max_steps, 64);
    }

    #[test]
    fn test_builders() {
        let config = FlowConfig::new().with_max_steps(8).with_max_note_chars(16);
        assert_eq!(config.max_steps, 8);
        assert_eq!(config.max_note_chars, 16);
    }
}
