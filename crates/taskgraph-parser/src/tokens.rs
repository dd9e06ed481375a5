//! Token types for the composed task DSL.

use std::fmt;

use crate::span::Span;

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// App names, labels, argument keys and unquoted exit statuses
    Identifier,
    /// `||`
    DoublePipe,
    /// `&&`
    AmpAmp,
    /// `->`
    Arrow,
    /// `:`
    Colon,
    /// `*`
    Star,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `<`
    LeftAngle,
    /// `>`
    RightAngle,
    /// A quoted argument, quotes included in the token text
    StringArg,
    /// `--`
    DoubleMinus,
    /// `=`
    Equals,
    /// An unquoted argument value, only lexed right after `=`
    ArgValue,
    Newline,
    /// Input the lexer could not recognize
    Error,
    Eof,
}

impl TokenKind {
    /// Human readable description used in diagnostics.
    pub fn description(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::DoublePipe => "`||`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::Arrow => "`->`",
            TokenKind::Colon => "`:`",
            TokenKind::Star => "`*`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftAngle => "`<`",
            TokenKind::RightAngle => "`>`",
            TokenKind::StringArg => "quoted string",
            TokenKind::DoubleMinus => "`--`",
            TokenKind::Equals => "`=`",
            TokenKind::ArgValue => "argument value",
            TokenKind::Newline => "newline",
            TokenKind::Error => "invalid input",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A token with its verbatim source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Newline => write!(f, "newline"),
            _ => write!(f, "`{}`", self.text),
        }
    }
}
