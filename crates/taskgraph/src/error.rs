//! Error types for task tool operations.
//!
//! [`TaskgraphError`] distinguishes the stage that failed. Whatever the
//! stage, [`TaskgraphError::descriptors`] flattens it into the boundary
//! error shape.

use thiserror::Error;

use taskgraph_core::descriptor::Descriptor;
use taskgraph_parser::{Diagnostic, ValidationError};

/// The main error type for task tool operations.
#[derive(Debug, Clone, Error)]
pub enum TaskgraphError {
    /// The definition could not be tokenized or parsed.
    #[error("{0}")]
    Syntax(Diagnostic),

    /// The definition parsed but breaks semantic rules.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The graph cannot be expressed as a definition.
    #[error("{0}")]
    Graph(Diagnostic),
}

impl TaskgraphError {
    /// All problems, as boundary descriptors.
    pub fn descriptors(&self) -> Vec<Descriptor> {
        match self {
            TaskgraphError::Syntax(diagnostic) | TaskgraphError::Graph(diagnostic) => {
                vec![diagnostic.to_descriptor()]
            }
            TaskgraphError::Validation(err) => err
                .diagnostics()
                .iter()
                .map(Diagnostic::to_descriptor)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskgraph_parser::{ErrorCode, Span};

    #[test]
    fn test_validation_descriptors_keep_order() {
        let err = TaskgraphError::from(ValidationError::new(vec![
            Diagnostic::error("first").with_label(Span::new(0..1), "here"),
            Diagnostic::error("second"),
        ]));

        let descriptors = err.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].range(), Some((0, 1)));
        assert_eq!(descriptors[1].message(), "second");
    }

    #[test]
    fn test_graph_error_display() {
        let err = TaskgraphError::Graph(
            Diagnostic::error("graph has no START node").with_code(ErrorCode::E300),
        );

        assert_eq!(err.to_string(), "error[E300]: graph has no START node");
        assert_eq!(err.descriptors()[0].range(), None);
    }
}
