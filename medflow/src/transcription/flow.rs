//! Wiring of the transcription flow.

use super::config::FlowConfig;
use super::stages::{
    names, AnalyzeStage, IngestStage, RespondStage, StructureStage, TO_ANALYZE, TO_RESPOND,
    TO_STRUCTURE,
};
use crate::context::TranscriptContext;
use crate::core::Outcome;
use crate::errors::FlowBuildError;
use crate::pipeline::{FlowBuilder, FlowGraph};

/// Name of the transcription flow.
pub const FLOW_NAME: &str = "medical_transcription";

/// Builds the ingest → structure → analyze → respond flow.
///
/// Every error outcome leads to respond, so each message gets exactly one
/// reply.
///
/// # Errors
///
/// Returns a [`FlowBuildError`] if `config.max_steps` is too small for the
/// full ingest-to-respond path, or if the wiring below is inconsistent with
/// the stages' declared outcomes.
pub fn build_transcription_flow(
    config: &FlowConfig,
) -> Result<FlowGraph<TranscriptContext>, FlowBuildError> {
    FlowBuilder::new(FLOW_NAME)
        .stage(IngestStage)
        .stage(StructureStage::new(
            config.lexicon.clone(),
            config.max_note_chars,
        ))
        .stage(AnalyzeStage)
        .stage(RespondStage)
        .entry(names::INGEST)
        .edge(names::INGEST, TO_STRUCTURE, names::STRUCTURE)
        .edge(names::INGEST, TO_RESPOND, names::RESPOND)
        .edge(names::INGEST, Outcome::ERROR, names::RESPOND)
        .edge(names::STRUCTURE, TO_ANALYZE, names::ANALYZE)
        .edge(names::STRUCTURE, Outcome::ERROR, names::RESPOND)
        .edge(names::ANALYZE, TO_RESPOND, names::RESPOND)
        .edge(names::ANALYZE, Outcome::ERROR, names::RESPOND)
        .terminal(names::RESPOND, Outcome::DONE)
        .acyclic()
        .max_steps(config.max_steps)
        .build()
}
