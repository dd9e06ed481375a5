//! Configuration for the task tools.
//!
//! [`ToolsConfig`] implements [`serde::Deserialize`] so it can be embedded
//! in a host application's configuration. Every field has a default.
//!
//! # Example
//!
//! ```
//! # use taskgraph::config::ToolsConfig;
//! let config = ToolsConfig::default();
//! assert_eq!(config.max_task_name_length(), 63);
//! assert!(config.allow_empty_graphs());
//! ```

use serde::Deserialize;

use taskgraph_parser::{DEFAULT_MAX_TASK_NAME_LENGTH, ParserConfig};

/// Options for parsing and validating task definitions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Upper bound on a task name, in characters.
    max_task_name_length: usize,

    /// Whether task names are checked against `max_task_name_length`.
    validate_task_name_length: bool,

    /// Whether a definition with no steps is accepted.
    allow_empty_graphs: bool,
}

impl ToolsConfig {
    /// Creates a new [`ToolsConfig`].
    ///
    /// # Arguments
    ///
    /// * `max_task_name_length` - Longest accepted task name.
    /// * `validate_task_name_length` - Whether to enforce the name limit.
    /// * `allow_empty_graphs` - Whether empty definitions are accepted.
    pub fn new(
        max_task_name_length: usize,
        validate_task_name_length: bool,
        allow_empty_graphs: bool,
    ) -> Self {
        Self {
            max_task_name_length,
            validate_task_name_length,
            allow_empty_graphs,
        }
    }

    pub fn max_task_name_length(&self) -> usize {
        self.max_task_name_length
    }

    pub fn validate_task_name_length(&self) -> bool {
        self.validate_task_name_length
    }

    pub fn allow_empty_graphs(&self) -> bool {
        self.allow_empty_graphs
    }

    /// The parser options these settings translate to.
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig::new(
            self.validate_task_name_length,
            self.allow_empty_graphs,
            self.max_task_name_length,
        )
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TASK_NAME_LENGTH, true, true)
    }
}
