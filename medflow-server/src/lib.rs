//! # Medflow Server
//!
//! HTTP and WebSocket front end for the medflow transcription pipeline.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | liveness message |
//! | `GET /api/status` | connected client count and version |
//! | `GET /ws` | WebSocket upgrade; one transcript JSON object per text frame |
//!
//! Each inbound frame runs through the transcription flow and the reply goes
//! back to the sender only. When a client leaves, the others are told.

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

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod websocket;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use server::{build_router, AppState, MedflowServer};
pub use websocket::{run_session, SessionSettings};
