//! # Taskgraph Parser
//!
//! Parser for the composed task definition language. A definition chains
//! task apps with `&&`, runs branches in parallel with `<a || b>` and jumps
//! on exit statuses with `'STATUS' -> label`:
//!
//! ```text
//! prepare --env=prod && <load-a || load-b> 'FAILED' -> cleanup && report
//! cleanup: notify --channel='#ops'
//! ```
//!
//! ## Usage
//!
//! ```
//! # use taskgraph_parser::{parse, validate, ParserConfig};
//!
//! let config = ParserConfig::default();
//! let task = parse("nightly", "a: foo 'FAILED' -> b && b: bar", &config).unwrap();
//!
//! assert!(validate(&task, &config).is_empty());
//! assert_eq!(task.to_string(), "a: foo 'FAILED' -> b && b: bar");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod tokens;

mod config;
mod parser;
mod span;
mod validate;

pub use config::{DEFAULT_MAX_TASK_NAME_LENGTH, ParserConfig};
pub use error::{Diagnostic, ErrorCode, ValidationError};
pub use parser::parse;
pub use span::{Span, Spanned};
pub use validate::validate;
