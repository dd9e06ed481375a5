//! Diagnostics produced while reading a composed task definition.
//!
//! Every problem found by the lexer, the parser, the validator or the graph
//! checks is a [`Diagnostic`]: an [`ErrorCode`], a message, labelled source
//! spans and an optional hint. Validation reports all of its problems at
//! once, wrapped in a [`ValidationError`].
//!
//! # Example
//!
//! ```
//! # use taskgraph_parser::error::{Diagnostic, ErrorCode};
//! # use taskgraph_parser::Span;
//!
//! let diag = Diagnostic::error("label `b` is defined multiple times")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(12..13), "duplicate label")
//!     .with_secondary_label(Span::new(0..1), "first defined here")
//!     .with_help("labels must be unique within a task");
//!
//! assert_eq!(diag.to_descriptor().range(), Some((12, 13)));
//! ```

mod diagnostic;
mod error_code;
mod label;
mod validation_error;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use validation_error::ValidationError;
