//! Core domain model types for medflow.
//!
//! This module contains the fundamental types used by every flow:
//! - [`Outcome`] labels returned by a stage's finalize phase
//! - [`StageFailure`] and [`StageResult`], the errors-as-data output of a
//!   stage's compute phase

mod outcome;
mod output;

pub use outcome::Outcome;
pub use output::{StageFailure, StageResult};
