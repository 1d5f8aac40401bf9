//! Stage compute results.
//!
//! A stage never lets a failure escape as a panic or as an error returned to
//! the engine. Its compute phase returns a [`StageResult`], and the finalize
//! phase inspects the tag to pick an outcome label.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a stage's compute phase.
pub type StageResult<T> = Result<T, StageFailure>;

/// A failure captured inside a stage, carried as data.
///
/// `Display` yields only the message, because that text is what ends up in
/// the `{"error": ...}` payload sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl StageFailure {
    /// Creates a new stage failure.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Failure raised when a stage finds a context slot empty that an
    /// earlier stage should have written.
    #[must_use]
    pub fn missing_input(stage: impl Into<String>, slot: &str) -> Self {
        Self::new(stage, format!("missing pipeline input: {slot}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_only() {
        let failure = StageFailure::new("ingest", "expected value at line 1 column 1");
        assert_eq!(failure.to_string(), "expected value at line 1 column 1");
        assert_eq!(failure.stage, "ingest");
    }

    #[test]
    fn test_missing_input() {
        let failure = StageFailure::missing_input("analyze", "structured_data");
        assert_eq!(failure.message, "missing pipeline input: structured_data");
    }
}
