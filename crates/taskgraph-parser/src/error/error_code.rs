//! Error codes for task definition diagnostics.
//!
//! Codes are grouped by the stage that reports them:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Validation errors
//! - `E3xx` - Graph errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated quoted string.
    ///
    /// A string argument was opened with a quote that is not closed on the
    /// same line.
    E001,

    /// Unexpected character.
    ///
    /// A character that starts no token, such as a lone `|` or `&`.
    E002,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input.
    ///
    /// The definition ended in the middle of a step, split or transition.
    E101,

    /// Empty definition.
    ///
    /// The definition contains no steps and empty tasks are not allowed.
    E102,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// Transition to an undefined label.
    E200,

    /// Duplicate label.
    E201,

    /// Split with a single branch.
    E202,

    /// Task name too long.
    E203,

    /// Reserved label.
    ///
    /// `START` and `END` name the sentinel nodes and cannot label a step.
    E204,

    /// Transition to a split.
    ///
    /// Transitions can only target task apps.
    E205,

    /// Wildcard transition.
    ///
    /// `*` is the default flow and cannot be used as a transition status.
    E206,

    /// Duplicate exit status on one step.
    E207,

    /// Duplicate argument key on one task app.
    E208,

    /// Reserved task app name.
    E209,

    // =========================================================================
    // Graph Errors (E3xx)
    // =========================================================================
    /// Missing `START` node.
    E300,

    /// Missing `END` node.
    E301,

    /// Link endpoint does not exist.
    E302,

    /// Conflicting links.
    ///
    /// A node has two links with the same exit status, or a link is
    /// repeated.
    E303,

    /// Sentinel misuse.
    ///
    /// `START` has incoming links or no outgoing link, or `END` has
    /// outgoing links or no incoming link.
    E304,

    /// Invalid default flow.
    ///
    /// The `*` links do not describe a sequence of steps and splits from
    /// `START` to `END`.
    E305,

    /// Duplicate node id.
    E306,

    /// Invalid transition endpoint.
    ///
    /// Transitions cannot leave `START` or a pass-through join, and cannot
    /// enter `START` or a join.
    E307,

    /// Graph content not expressible as text.
    ///
    /// A node name, label or property key is not a valid identifier, a
    /// label is reserved or used twice, or a value spans several lines.
    /// Also a label on a `SYNC` node that joins nothing.
    E308,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            // Validation errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            // Graph errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string",
            ErrorCode::E002 => "unexpected character",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "empty task definition",
            // Validation errors
            ErrorCode::E200 => "undefined label",
            ErrorCode::E201 => "duplicate label",
            ErrorCode::E202 => "split needs two branches",
            ErrorCode::E203 => "task name too long",
            ErrorCode::E204 => "reserved label",
            ErrorCode::E205 => "transition to a split",
            ErrorCode::E206 => "wildcard transition",
            ErrorCode::E207 => "duplicate exit status",
            ErrorCode::E208 => "duplicate argument",
            ErrorCode::E209 => "reserved app name",
            // Graph errors
            ErrorCode::E300 => "missing START node",
            ErrorCode::E301 => "missing END node",
            ErrorCode::E302 => "dangling link",
            ErrorCode::E303 => "conflicting links",
            ErrorCode::E304 => "invalid sentinel links",
            ErrorCode::E305 => "invalid default flow",
            ErrorCode::E306 => "duplicate node id",
            ErrorCode::E307 => "invalid transition endpoint",
            ErrorCode::E308 => "not expressible as text",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
