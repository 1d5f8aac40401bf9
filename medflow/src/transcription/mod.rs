//! The medical transcription pipeline.
//!
//! Each inbound fragment runs through four stages:
//!
//! ```text
//! ingest ──structure──▶ structure ──analyze──▶ analyze ──respond──▶ respond
//!    │                      │                     │                    ▲
//!    ├──respond─────────────┼─────────────────────┼────────────────────┤
//!    └──error───────────────┴──error──────────────┴──error─────────────┘
//! ```
//!
//! The respond stage always writes exactly one reply, which
//! [`TranscriptionService`] delivers to the connection that sent the fragment.

mod analysis;
mod config;
mod flow;
mod lexicon;
mod payload;
mod record;
mod service;
mod stages;

pub use analysis::render_analysis;
pub use config::FlowConfig;
pub use flow::{build_transcription_flow, FLOW_NAME};
pub use lexicon::{Lexicon, Term, BLOOD_PRESSURE, TEMPERATURE, UNSPECIFIED_VALUE};
pub use payload::{EmptyObject, ResponsePayload};
pub use record::{StructuredRecord, Transcript};
pub use service::{MessageOutcome, TranscriptionService, DISCONNECT_NOTICE};
pub use stages::{
    names, AnalyzeStage, IngestStage, ReplyParts, RespondStage, StructureStage, DATA_PARAM,
    TO_ANALYZE, TO_RESPOND, TO_STRUCTURE,
};
