//! Error types for medflow.
//!
//! Graph construction and transport writes are the only operations that
//! report errors to their caller. Failures inside a pipeline stage are not
//! errors at this level: they travel as [`StageFailure`](crate::core::StageFailure)
//! values and are routed like any other outcome.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for medflow operations.
#[derive(Debug, Error)]
pub enum MedflowError {
    /// A flow graph failed validation.
    #[error("{0}")]
    FlowBuild(#[from] FlowBuildError),

    /// Writing to a connection failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What kind of validation rule a flow graph broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowBuildErrorKind {
    /// The graph has no stages.
    Empty,
    /// No entry stage was declared.
    MissingEntry,
    /// Two stages share a name.
    DuplicateStage,
    /// An edge, terminal or entry names a stage that does not exist.
    UnknownStage,
    /// An edge or terminal uses a label the source stage never returns.
    UndeclaredOutcome,
    /// A declared outcome has neither an edge nor a terminal marker.
    DanglingOutcome,
    /// The same `(stage, outcome)` pair is mapped twice.
    DuplicateEdge,
    /// A stage cannot be reached from the entry stage.
    Unreachable,
    /// The graph contains a cycle and was built with `acyclic()`.
    Cycle,
    /// The step limit is zero, or shorter than the longest path through an
    /// acyclic graph.
    StepLimit,
}

impl FlowBuildErrorKind {
    /// Stable error code for logs and diagnostics.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Empty => "FLOW-001-EMPTY",
            Self::MissingEntry => "FLOW-002-MISSING_ENTRY",
            Self::DuplicateStage => "FLOW-003-DUPLICATE_STAGE",
            Self::UnknownStage => "FLOW-004-UNKNOWN_STAGE",
            Self::UndeclaredOutcome => "FLOW-005-UNDECLARED_OUTCOME",
            Self::DanglingOutcome => "FLOW-006-DANGLING_OUTCOME",
            Self::DuplicateEdge => "FLOW-007-DUPLICATE_EDGE",
            Self::Unreachable => "FLOW-008-UNREACHABLE",
            Self::Cycle => "FLOW-009-CYCLE",
            Self::StepLimit => "FLOW-010-STEP_LIMIT",
        }
    }

    /// Default hint for fixing the error.
    #[must_use]
    pub const fn fix_hint(self) -> &'static str {
        match self {
            Self::Empty => "Add at least one stage to the flow before building.",
            Self::MissingEntry => "Call `entry(..)` with the name of the first stage.",
            Self::DuplicateStage => "Give every stage a unique name.",
            Self::UnknownStage => "Check the stage names used in edges for typos.",
            Self::UndeclaredOutcome => {
                "Add the label to the stage's `outcomes()` or remove the edge."
            }
            Self::DanglingOutcome => {
                "Map the label to a stage with `edge(..)` or mark it with `terminal(..)`."
            }
            Self::DuplicateEdge => "Each (stage, outcome) pair may lead to one place only.",
            Self::Unreachable => "Connect the stage to the graph or remove it.",
            Self::Cycle => "Remove one edge of the cycle or build without `acyclic()`.",
            Self::StepLimit => "Raise `max_steps` to at least the number of stages on the longest path.",
        }
    }
}

impl fmt::Display for FlowBuildErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error raised when a flow graph fails validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FlowBuildError {
    /// Which rule was broken.
    pub kind: FlowBuildErrorKind,
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl FlowBuildError {
    /// Creates a new flow build error.
    #[must_use]
    pub fn new(kind: FlowBuildErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("stages".to_string(), serde_json::json!(self.stages));
        map.insert("fix_hint".to_string(), serde_json::json!(self.kind.fix_hint()));
        map
    }
}

/// Errors writing to a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer is gone; nothing more can be written.
    #[error("connection closed")]
    Closed,

    /// The peer's outbound queue is full; it is not keeping up.
    #[error("outbound queue full")]
    QueueFull,

    /// The write itself failed.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_build_error_to_dict() {
        let err = FlowBuildError::new(FlowBuildErrorKind::DanglingOutcome, "dangling")
            .with_stages(vec!["ingest".to_string()]);

        let dict = err.to_dict();
        assert_eq!(dict.get("code").unwrap(), "FLOW-006-DANGLING_OUTCOME");
        assert_eq!(dict.get("message").unwrap(), "dangling");
        assert_eq!(dict.get("stages").unwrap(), &serde_json::json!(["ingest"]));
        assert!(dict.contains_key("fix_hint"));
    }

    #[test]
    fn test_kind_display_is_code() {
        assert_eq!(FlowBuildErrorKind::Cycle.to_string(), "FLOW-009-CYCLE");
        assert_eq!(FlowBuildErrorKind::StepLimit.to_string(), "FLOW-010-STEP_LIMIT");
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::Closed.to_string(), "connection closed");
        assert_eq!(TransportError::QueueFull.to_string(), "outbound queue full");
        assert_eq!(
            TransportError::WriteFailed("broken pipe".into()).to_string(),
            "write failed: broken pipe"
        );
    }

    #[test]
    fn test_medflow_error_from_build_error() {
        let err: MedflowError = FlowBuildError::new(FlowBuildErrorKind::Empty, "empty").into();
        assert!(matches!(err, MedflowError::FlowBuild(_)));
        assert_eq!(err.to_string(), "empty");
    }
}
