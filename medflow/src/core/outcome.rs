//! Outcome labels used to route between stages.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A label returned by a stage's finalize phase.
///
/// The flow graph maps `(stage, outcome)` to the next stage. Labels compare
/// by their string value, so `Outcome::new("error")` built in two places
/// routes the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome(Cow<'static, str>);

impl Outcome {
    /// Conventional label for a stage that converted a failure into data.
    pub const ERROR: Self = Self::new("error");

    /// Conventional label for the last stage of a flow.
    pub const DONE: Self = Self::new("done");

    /// Creates an outcome from a static label.
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self(Cow::Borrowed(label))
    }

    /// Creates an outcome from an owned label.
    #[must_use]
    pub fn owned(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    /// Returns the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Outcome {
    fn from(label: &'static str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Outcome {
    fn from(label: String) -> Self {
        Self::owned(label)
    }
}

impl PartialEq<str> for Outcome {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Outcome {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
