//! All problems found while validating one task definition.

use thiserror::Error;

use crate::error::Diagnostic;

/// Validation failure carrying every problem found, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.diagnostics))]
pub struct ValidationError {
    diagnostics: Vec<Diagnostic>,
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => String::from("task definition is invalid"),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

impl ValidationError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl From<Vec<Diagnostic>> for ValidationError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}
