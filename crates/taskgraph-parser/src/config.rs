//! Parser configuration.

/// Default upper bound on a task name, in characters.
pub const DEFAULT_MAX_TASK_NAME_LENGTH: usize = 63;

/// Options controlling parsing and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Report task names longer than `max_task_name_length`
    pub validate_task_name_length: bool,
    /// Accept a definition with no steps
    pub allow_empty_graphs: bool,
    pub max_task_name_length: usize,
}

impl ParserConfig {
    pub fn new(
        validate_task_name_length: bool,
        allow_empty_graphs: bool,
        max_task_name_length: usize,
    ) -> Self {
        Self {
            validate_task_name_length,
            allow_empty_graphs,
            max_task_name_length,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(true, true, DEFAULT_MAX_TASK_NAME_LENGTH)
    }
}
