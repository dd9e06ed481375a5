//! Boundary error descriptors.
//!
//! Every failure reported to a client, whether it came from lexing,
//! parsing, validation or graph conversion, is flattened into a
//! [`Descriptor`] so that error lists can be rendered uniformly.

use serde::{Deserialize, Serialize};

/// A machine-consumable error: a message and an optional source range.
///
/// The range is a `[start, end)` byte range into the DSL text the error
/// refers to. Errors about graphs carry no range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<(usize, usize)>,
}

impl Descriptor {
    /// Create a descriptor without a source range.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            range: None,
        }
    }

    /// Attach a `[start, end)` source range.
    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Get the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source range, if any.
    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }
}
