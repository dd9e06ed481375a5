//! Taskgraph - conversion between composed task definitions and graphs.
//!
//! A composed task is written in a small text DSL (`foo && <bar || baz>`)
//! and edited graphically as nodes and links. [`TaskTools`] converts in both
//! directions and reports every failure as a list of [`Descriptor`]s.

pub mod config;
pub mod graph;

mod error;

pub use taskgraph_core::{
    descriptor::Descriptor,
    graph::{Graph, Link, Node},
};
pub use taskgraph_parser::ast;

pub use error::TaskgraphError;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use taskgraph_parser::ValidationError;

use config::ToolsConfig;

/// Input of [`TaskTools::parse_task_text_to_graph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTextRequest {
    pub name: String,
    pub dsl: String,
}

impl TaskTextRequest {
    pub fn new(name: impl Into<String>, dsl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dsl: dsl.into(),
        }
    }
}

/// Result of converting text to a graph.
///
/// `graph` is only present when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGraphResponse {
    pub graph: Option<Graph>,
    pub errors: Vec<Descriptor>,
}

/// Result of converting a graph to text.
///
/// `dsl` is only present when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDslResponse {
    pub dsl: Option<String>,
    pub errors: Vec<Descriptor>,
}

/// Entry point for converting between task definitions and graphs.
///
/// # Examples
///
/// ```rust
/// use taskgraph::{TaskTextRequest, TaskTools};
///
/// let tools = TaskTools::default();
///
/// let response = tools.parse_task_text_to_graph(&TaskTextRequest::new("etl", "foo && bar"));
/// assert!(response.errors.is_empty());
///
/// let graph = response.graph.expect("Failed to build graph");
/// assert_eq!(graph.nodes().len(), 4);
///
/// let text = tools.convert_task_graph_to_text(&graph);
/// assert_eq!(text.dsl.as_deref(), Some("foo && bar"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskTools {
    config: ToolsConfig,
}

impl TaskTools {
    /// Create task tools with the given configuration.
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    /// Parse and validate a task definition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskgraphError::Syntax`] if the text does not parse and
    /// [`TaskgraphError::Validation`] with every semantic problem otherwise.
    pub fn parse(&self, name: &str, dsl: &str) -> Result<ast::ComposedTask, TaskgraphError> {
        info!(task = name; "Parsing task definition");
        let parser_config = self.config.parser_config();

        let task =
            taskgraph_parser::parse(name, dsl, &parser_config).map_err(TaskgraphError::Syntax)?;

        let problems = taskgraph_parser::validate(&task, &parser_config);
        if !problems.is_empty() {
            debug!(task = name, problems = problems.len(); "Task definition failed validation");
            return Err(ValidationError::new(problems).into());
        }

        debug!(task = name, steps = task.walk().len(); "Task definition parsed successfully");
        trace!(task:?; "Parsed task definition");
        Ok(task)
    }

    /// Parse a task definition and build its graph.
    ///
    /// # Errors
    ///
    /// See [`TaskTools::parse`].
    pub fn graph(&self, name: &str, dsl: &str) -> Result<Graph, TaskgraphError> {
        let task = self.parse(name, dsl)?;
        Ok(graph::to_graph(&task))
    }

    /// Render a graph as DSL text.
    ///
    /// # Errors
    ///
    /// Returns [`TaskgraphError::Graph`] if the graph is malformed or cannot
    /// be written as a definition.
    pub fn dsl_text(&self, graph: &Graph) -> Result<String, TaskgraphError> {
        info!(nodes = graph.nodes().len(), links = graph.links().len(); "Converting task graph");
        graph::to_dsl_text(graph).map_err(TaskgraphError::Graph)
    }

    /// Convert a definition to a graph, collecting failures as descriptors.
    ///
    /// No graph is returned when any problem is found.
    pub fn parse_task_text_to_graph(&self, request: &TaskTextRequest) -> TaskGraphResponse {
        match self.graph(&request.name, &request.dsl) {
            Ok(graph) => TaskGraphResponse {
                graph: Some(graph),
                errors: Vec::new(),
            },
            Err(err) => TaskGraphResponse {
                graph: None,
                errors: err.descriptors(),
            },
        }
    }

    /// Convert a graph to a definition, collecting failures as descriptors.
    pub fn convert_task_graph_to_text(&self, graph: &Graph) -> TaskDslResponse {
        match self.dsl_text(graph) {
            Ok(dsl) => TaskDslResponse {
                dsl: Some(dsl),
                errors: Vec::new(),
            },
            Err(err) => TaskDslResponse {
                dsl: None,
                errors: err.descriptors(),
            },
        }
    }
}
