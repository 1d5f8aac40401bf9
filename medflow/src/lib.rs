//! # Medflow
//!
//! Transcript processing pipelines and connection fan-out for live medical
//! dictation.
//!
//! Medflow provides:
//!
//! - **Outcome-routed flows**: stages run prepare, compute and finalize, and
//!   the label they return picks the next stage from a validated graph
//! - **Typed per-message context**: every slot a stage reads or writes is a
//!   field, and failures travel as data instead of panics
//! - **Connection registry**: an ordered set of live peers with targeted and
//!   fan-out delivery that survives peers leaving mid-broadcast
//! - **Transcription pipeline**: ingest, structure, analyze and respond stages
//!   wired into a ready-made flow
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use medflow::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ConnectionRegistry::new());
//! let service = TranscriptionService::from_config(&FlowConfig::default(), registry)?;
//!
//! let (sink, mut outbound) = ChannelSink::new(32);
//! let (handle, _) = service.connect(Arc::new(sink));
//! service
//!     .handle_message(handle.id(), r#"{"note": "paciente com febre", "listening": true}"#)
//!     .await;
//! let reply = outbound.recv().await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod connections;
pub mod context;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod transcription;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::connections::{
        Broadcaster, ChannelSink, ConnectionHandle, ConnectionId, ConnectionRegistry,
        ConnectionSink,
    };
    pub use crate::context::TranscriptContext;
    pub use crate::core::{Outcome, StageFailure, StageResult};
    pub use crate::errors::{FlowBuildError, FlowBuildErrorKind, MedflowError, TransportError};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        FlowBuilder, FlowGraph, FlowParams, FlowStep, FlowTrace, Termination,
    };
    pub use crate::stages::{FnStage, Node, Stage};
    pub use crate::transcription::{
        build_transcription_flow, FlowConfig, MessageOutcome, StructuredRecord, Transcript,
        TranscriptionService,
    };
}

/// Version of the medflow crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
