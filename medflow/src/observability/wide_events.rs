//! One structured event per flow run.

use crate::pipeline::{FlowTrace, Termination};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Builds the wide event payload for a finished run.
#[must_use]
pub fn flow_run_payload(trace: &FlowTrace, connection_id: Option<&str>) -> Value {
    let stages: Vec<Value> = trace
        .steps
        .iter()
        .map(|s| {
            json!({
                "stage": s.stage,
                "outcome": s.outcome,
                "duration_ms": s.duration_ms,
            })
        })
        .collect();

    let mut payload = json!({
        "flow": trace.flow,
        "started_at": trace.started_at.to_rfc3339(),
        "duration_ms": trace.duration_ms,
        "steps": trace.steps.len(),
        "stages": stages,
        "termination": trace.termination,
    });

    if let Some(id) = connection_id {
        payload["connection_id"] = json!(id);
    }

    payload
}

/// Logs the wide event for a run.
///
/// Runs that stopped for any reason other than normal completion are logged
/// at warn level.
pub fn emit_flow_run(trace: &FlowTrace, connection_id: Option<&str>) {
    let payload = flow_run_payload(trace, connection_id);
    if matches!(trace.termination, Termination::Completed) {
        info!(event = "flow.run", payload = %payload, "Flow run finished");
    } else {
        warn!(event = "flow.run", payload = %payload, "Flow run stopped early");
    }
}
