//! Source spans annotated with a short message.

use crate::span::Span;

/// Whether a label marks the problem itself or related context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelStyle {
    Primary,
    Secondary,
}

/// A message pinned to a span of the task definition.
///
/// A diagnostic has at most one primary label, the place the problem is
/// reported at. Secondary labels point at related sites, such as the first
/// definition of a duplicated label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    style: LabelStyle,
}

impl Label {
    /// Create a label marking where the problem is.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Create a label pointing at related context.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.style == LabelStyle::Primary
    }

    pub fn is_secondary(&self) -> bool {
        self.style == LabelStyle::Secondary
    }
}
