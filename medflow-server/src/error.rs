//! Error types for the server.

use crate::config::ConfigError;
use medflow::errors::FlowBuildError;
use thiserror::Error;

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The transcription flow failed validation.
    #[error("invalid transcription flow: {0}")]
    Flow(#[from] FlowBuildError),

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
