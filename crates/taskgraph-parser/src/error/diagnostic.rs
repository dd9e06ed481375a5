//! The diagnostic type shared by every stage.

use std::fmt;

use taskgraph_core::descriptor::Descriptor;

use crate::{
    error::{error_code::ErrorCode, label::Label},
    span::Span,
};

/// An error in a task definition or graph.
///
/// A diagnostic has an optional [`ErrorCode`], a message, labelled source
/// spans and an optional hint on how to fix it. Graph errors have no
/// source to point at and carry no labels.
///
/// # Example
///
/// ```text
/// error[E200]: undefined label `kill1`
///   |
/// 1 | foo 'fail' -> kill1 && bar
///   |               ^^^^^ no step has this label
///   |
///   = help: label a task app with `kill1: <app>` or target `END`
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use taskgraph_parser::error::{Diagnostic, ErrorCode};
    /// # use taskgraph_parser::Span;
    ///
    /// let diag = Diagnostic::error("undefined label `kill1`")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label(Span::new(14..19), "no step has this label");
    ///
    /// assert_eq!(diag.to_string(), "error[E200]: undefined label `kill1`");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Flatten into the boundary error shape: the message plus the primary
    /// span as range.
    pub fn to_descriptor(&self) -> Descriptor {
        let descriptor = Descriptor::new(self.message.clone());
        match self.primary_span() {
            Some(span) => descriptor.with_range(span.start(), span.end()),
            None => descriptor,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

impl From<&Diagnostic> for Descriptor {
    fn from(diagnostic: &Diagnostic) -> Self {
        diagnostic.to_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("label `b` is defined multiple times")
            .with_code(ErrorCode::E201)
            .with_label(Span::new(12..13), "duplicate label")
            .with_secondary_label(Span::new(0..1), "first defined here")
            .with_help("labels must be unique within a task");

        assert_eq!(diag.code(), Some(ErrorCode::E201));
        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_primary());
        assert!(diag.labels()[1].is_secondary());
        assert_eq!(diag.help(), Some("labels must be unique within a task"));
        assert_eq!(diag.primary_span(), Some(Span::new(12..13)));
    }

    #[test]
    fn test_diagnostic_display() {
        let coded = Diagnostic::error("unexpected `>`").with_code(ErrorCode::E100);
        let plain = Diagnostic::error("graph has no START node");

        assert_eq!(coded.to_string(), "error[E100]: unexpected `>`");
        assert_eq!(plain.to_string(), "error: graph has no START node");
    }

    #[test]
    fn test_descriptor_uses_primary_span() {
        let diag = Diagnostic::error("undefined label `kill1`")
            .with_secondary_label(Span::new(0..3), "context")
            .with_label(Span::new(14..19), "no step has this label");

        let descriptor = diag.to_descriptor();
        assert_eq!(descriptor.message(), "undefined label `kill1`");
        assert_eq!(descriptor.range(), Some((14, 19)));
    }

    #[test]
    fn test_descriptor_without_labels_has_no_range() {
        let descriptor = Descriptor::from(&Diagnostic::error("graph has no END node"));

        assert_eq!(descriptor.range(), None);
    }
}
