//! The four stages of the transcription flow.

use super::analysis::render_analysis;
use super::lexicon::Lexicon;
use super::payload::ResponsePayload;
use super::record::{StructuredRecord, Transcript};
use crate::context::TranscriptContext;
use crate::core::{Outcome, StageFailure, StageResult};
use crate::pipeline::FlowParams;
use crate::stages::Stage;
use tracing::debug;

/// Stage names.
pub mod names {
    /// Parses the inbound message.
    pub const INGEST: &str = "ingest";
    /// Extracts clinical terms from the note.
    pub const STRUCTURE: &str = "structure";
    /// Renders the analysis text.
    pub const ANALYZE: &str = "analyze";
    /// Builds the reply.
    pub const RESPOND: &str = "respond";
}

/// Routes to the structure stage.
pub const TO_STRUCTURE: Outcome = Outcome::new("structure");
/// Routes to the analyze stage.
pub const TO_ANALYZE: Outcome = Outcome::new("analyze");
/// Routes to the respond stage.
pub const TO_RESPOND: Outcome = Outcome::new("respond");

/// Parameter holding the raw inbound message.
pub const DATA_PARAM: &str = "data";

const INGEST_OUTCOMES: &[Outcome] = &[TO_STRUCTURE, TO_RESPOND, Outcome::ERROR];
const STRUCTURE_OUTCOMES: &[Outcome] = &[TO_ANALYZE, Outcome::ERROR];
const ANALYZE_OUTCOMES: &[Outcome] = &[TO_RESPOND, Outcome::ERROR];
const RESPOND_OUTCOMES: &[Outcome] = &[Outcome::DONE];

/// Parses the inbound JSON into a [`Transcript`].
///
/// Reads the `data` parameter when present, otherwise the raw message held
/// by the context. A fragment without a note skips straight to respond.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStage;

impl Stage<TranscriptContext> for IngestStage {
    type Input = Option<String>;
    type Output = Transcript;

    fn name(&self) -> &str {
        names::INGEST
    }

    fn outcomes(&self) -> &[Outcome] {
        INGEST_OUTCOMES
    }

    fn prepare(&self, ctx: &TranscriptContext, params: &FlowParams) -> Self::Input {
        params
            .get_str(DATA_PARAM)
            .or_else(|| ctx.raw_message())
            .map(str::to_string)
    }

    fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        let raw = input
            .as_deref()
            .ok_or_else(|| StageFailure::missing_input(names::INGEST, DATA_PARAM))?;
        serde_json::from_str(raw).map_err(|e| StageFailure::new(names::INGEST, e.to_string()))
    }

    fn finalize(
        &self,
        ctx: &mut TranscriptContext,
        _input: Self::Input,
        output: StageResult<Self::Output>,
    ) -> Outcome {
        match output {
            Ok(transcript) => {
                let next = if transcript.has_note() {
                    TO_STRUCTURE
                } else {
                    TO_RESPOND
                };
                ctx.set_transcript(transcript);
                next
            }
            Err(failure) => {
                debug!(error = %failure, "Rejected inbound message");
                ctx.set_error(failure.message);
                Outcome::ERROR
            }
        }
    }
}

/// Extracts a [`StructuredRecord`] from the transcript's note.
#[derive(Debug, Clone)]
pub struct StructureStage {
    lexicon: Lexicon,
    max_note_chars: usize,
}

impl StructureStage {
    /// Creates a structure stage.
    #[must_use]
    pub const fn new(lexicon: Lexicon, max_note_chars: usize) -> Self {
        Self {
            lexicon,
            max_note_chars,
        }
    }
}

impl Stage<TranscriptContext> for StructureStage {
    type Input = Option<String>;
    type Output = StructuredRecord;

    fn name(&self) -> &str {
        names::STRUCTURE
    }

    fn outcomes(&self) -> &[Outcome] {
        STRUCTURE_OUTCOMES
    }

    fn prepare(&self, ctx: &TranscriptContext, _params: &FlowParams) -> Self::Input {
        ctx.transcript().map(|t| t.note.clone())
    }

    fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        let note = input
            .as_deref()
            .ok_or_else(|| StageFailure::missing_input(names::STRUCTURE, "transcript"))?;
        let chars = note.chars().count();
        if chars > self.max_note_chars {
            return Err(StageFailure::new(
                names::STRUCTURE,
                format!(
                    "note too long: {chars} characters (limit {})",
                    self.max_note_chars
                ),
            ));
        }
        Ok(self.lexicon.extract(note))
    }

    fn finalize(
        &self,
        ctx: &mut TranscriptContext,
        _input: Self::Input,
        output: StageResult<Self::Output>,
    ) -> Outcome {
        match output {
            Ok(record) => {
                ctx.set_structured(record);
                TO_ANALYZE
            }
            Err(failure) => {
                ctx.set_error(failure.message);
                Outcome::ERROR
            }
        }
    }
}

/// Renders the analysis text from the structured record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeStage;

impl Stage<TranscriptContext> for AnalyzeStage {
    type Input = Option<StructuredRecord>;
    type Output = String;

    fn name(&self) -> &str {
        names::ANALYZE
    }

    fn outcomes(&self) -> &[Outcome] {
        ANALYZE_OUTCOMES
    }

    fn prepare(&self, ctx: &TranscriptContext, _params: &FlowParams) -> Self::Input {
        ctx.structured().cloned()
    }

    fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        input
            .as_ref()
            .map(render_analysis)
            .ok_or_else(|| StageFailure::missing_input(names::ANALYZE, "structured_data"))
    }

    fn finalize(
        &self,
        ctx: &mut TranscriptContext,
        _input: Self::Input,
        output: StageResult<Self::Output>,
    ) -> Outcome {
        match output {
            Ok(analysis) => {
                ctx.set_analysis(analysis);
                TO_RESPOND
            }
            Err(failure) => {
                ctx.set_error(failure.message);
                Outcome::ERROR
            }
        }
    }
}

/// What the respond stage reads from the context.
#[derive(Debug, Clone, Default)]
pub struct ReplyParts {
    error: Option<String>,
    transcript: Option<Transcript>,
    structured: Option<StructuredRecord>,
    analysis: Option<String>,
}

/// Serializes the reply and marks it ready for delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct RespondStage;

impl Stage<TranscriptContext> for RespondStage {
    type Input = ReplyParts;
    type Output = String;

    fn name(&self) -> &str {
        names::RESPOND
    }

    fn outcomes(&self) -> &[Outcome] {
        RESPOND_OUTCOMES
    }

    fn prepare(&self, ctx: &TranscriptContext, _params: &FlowParams) -> Self::Input {
        ReplyParts {
            error: ctx.error().map(str::to_string),
            transcript: ctx.transcript().cloned(),
            structured: ctx.structured().cloned(),
            analysis: ctx.analysis().map(str::to_string),
        }
    }

    fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        let input = input.clone();
        ResponsePayload::from_parts(
            input.error,
            input.transcript,
            input.structured,
            input.analysis,
        )
        .to_json()
        .map_err(|e| StageFailure::new(names::RESPOND, e.to_string()))
    }

    fn finalize(
        &self,
        ctx: &mut TranscriptContext,
        _input: Self::Input,
        output: StageResult<Self::Output>,
    ) -> Outcome {
        let response = output.unwrap_or_else(|failure| {
            serde_json::json!({ "error": format!("Erro ao formatar resposta: {failure}") })
                .to_string()
        });
        ctx.set_response(response);
        ctx.clear_error();
        Outcome::DONE
    }
}
