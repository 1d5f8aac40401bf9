//! Flow building and execution.
//!
//! This module provides:
//! - Run parameters shared by every stage of one run
//! - A validating builder for outcome-labelled stage graphs
//! - The execution engine that walks a graph against a context
//! - Execution traces for logging and tests

mod builder;
mod graph;
#[cfg(test)]
mod integration_tests;
mod params;
mod trace;

pub use builder::FlowBuilder;
pub use graph::{FlowGraph, DEFAULT_MAX_STEPS};
pub use params::FlowParams;
pub use trace::{FlowStep, FlowTrace, Termination};
