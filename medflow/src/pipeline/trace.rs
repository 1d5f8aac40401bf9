//! Execution traces.

use crate::core::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stage invocation within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    /// The stage that ran.
    pub stage: String,
    /// The label its finalize phase returned.
    pub outcome: Outcome,
    /// Wall time spent in prepare, compute and finalize.
    pub duration_ms: f64,
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The last outcome had no outgoing edge. This is the normal ending.
    Completed,
    /// A stage returned a label it does not declare; the run stopped there
    /// instead of routing it.
    UndeclaredOutcome {
        /// The stage that returned the label.
        stage: String,
        /// The label.
        outcome: Outcome,
    },
    /// The run hit the step limit, which only cyclic graphs can reach.
    StepLimit {
        /// The configured limit.
        limit: usize,
    },
}

/// Record of a single flow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowTrace {
    /// The flow name.
    pub flow: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Stage invocations in order.
    pub steps: Vec<FlowStep>,
    /// Why the run stopped.
    pub termination: Termination,
    /// Total run time in milliseconds.
    pub duration_ms: f64,
}

impl FlowTrace {
    /// Returns the names of the stages that ran, in order.
    #[must_use]
    pub fn visited(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.stage.as_str()).collect()
    }

    /// Returns the outcome of the last stage, if any stage ran.
    #[must_use]
    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.steps.last().map(|s| &s.outcome)
    }

    /// Returns true if the run ended on an unmapped, declared outcome.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.termination, Termination::Completed)
    }
}
