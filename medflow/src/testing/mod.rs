//! Testing utilities for medflow.
//!
//! This module provides:
//! - Connection sinks that record or reject writes
//! - Builders for inbound transcript messages

mod fixtures;
mod mocks;

pub use fixtures::TranscriptMessage;
pub use mocks::{FailingSink, RecordingSink};
