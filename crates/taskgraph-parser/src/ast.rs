//! Abstract syntax tree of a composed task definition.
//!
//! Leaf values are wrapped in [`Spanned`] so diagnostics can point back at
//! the source. Composite nodes derive their span from their parts. Equality
//! ignores spans, which makes a parsed tree comparable with one built from a
//! graph.
//!
//! [`fmt::Display`] renders a tree back to canonical DSL text:
//!
//! ```text
//! label: app --key=value 'STATUS' -> target && <a || b> && c
//! ```

use std::fmt;

use crate::{
    lexer::is_argument_value_char,
    span::{Span, Spanned},
};

/// Root of a parsed task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTask {
    pub name: String,
    pub sequence: Sequence,
}

impl ComposedTask {
    pub fn new(name: impl Into<String>, sequence: Sequence) -> Self {
        Self {
            name: name.into(),
            sequence,
        }
    }

    /// Returns `true` when the definition has no steps.
    pub fn is_empty(&self) -> bool {
        self.sequence.steps.is_empty()
    }

    /// All steps of the tree in pre-order: a split comes before the steps
    /// of its branches.
    pub fn walk(&self) -> Vec<&Step> {
        let mut steps = Vec::new();
        self.sequence.collect_steps(&mut steps);
        steps
    }
}

/// Steps executed one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub steps: Vec<Step>,
}

impl Sequence {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn span(&self) -> Span {
        self.steps
            .iter()
            .map(Step::span)
            .reduce(|acc, span| acc.union(span))
            .unwrap_or_default()
    }

    fn collect_steps<'a>(&'a self, steps: &mut Vec<&'a Step>) {
        for step in &self.steps {
            steps.push(step);
            if let Step::Split(split) = step {
                for branch in &split.branches {
                    branch.collect_steps(steps);
                }
            }
        }
    }
}

/// One element of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    TaskApp(Spanned<TaskApp>),
    Split(Spanned<Split>),
}

impl Step {
    pub fn span(&self) -> Span {
        match self {
            Step::TaskApp(app) => app.span(),
            Step::Split(split) => split.span(),
        }
    }

    pub fn label(&self) -> Option<&Spanned<String>> {
        match self {
            Step::TaskApp(app) => app.label.as_ref(),
            Step::Split(split) => split.label.as_ref(),
        }
    }

    pub fn transitions(&self) -> &[Spanned<Transition>] {
        match self {
            Step::TaskApp(app) => &app.transitions,
            Step::Split(split) => &split.transitions,
        }
    }
}

/// An invocation of a registered app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskApp {
    pub label: Option<Spanned<String>>,
    pub name: Spanned<String>,
    pub arguments: Vec<Argument>,
    pub transitions: Vec<Spanned<Transition>>,
}

impl TaskApp {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            label: None,
            name,
            arguments: Vec::new(),
            transitions: Vec::new(),
        }
    }
}

/// A `--key=value` argument of a task app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub key: Spanned<String>,
    pub value: Spanned<String>,
}

impl Argument {
    pub fn span(&self) -> Span {
        self.key.span().union(self.value.span())
    }
}

/// Branches started together and joined before the flow continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub label: Option<Spanned<String>>,
    pub branches: Vec<Sequence>,
    pub transitions: Vec<Spanned<Transition>>,
}

/// A conditional jump taken when a step exits with a given status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub on_exit: Spanned<ExitStatus>,
    /// Label of the target step, or `END`
    pub target: Spanned<String>,
}

/// The exit status a transition fires on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// `*`, any status
    Wildcard,
    Code(String),
}

impl ExitStatus {
    /// The status as it appears in a graph link.
    pub fn as_str(&self) -> &str {
        match self {
            ExitStatus::Wildcard => "*",
            ExitStatus::Code(code) => code,
        }
    }
}

/// Write `value` in single quotes, doubling embedded quotes.
fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "''"))
}

fn write_label(f: &mut fmt::Formatter<'_>, label: &Option<Spanned<String>>) -> fmt::Result {
    match label {
        Some(label) => write!(f, "{}: ", label),
        None => Ok(()),
    }
}

fn write_transitions(f: &mut fmt::Formatter<'_>, transitions: &[Spanned<Transition>]) -> fmt::Result {
    for transition in transitions {
        write!(f, " {}", transition)?;
    }
    Ok(())
}

impl fmt::Display for ComposedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sequence)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::TaskApp(app) => write!(f, "{}", app),
            Step::Split(split) => write!(f, "{}", split),
        }
    }
}

impl fmt::Display for TaskApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_label(f, &self.label)?;
        write!(f, "{}", self.name)?;
        for argument in &self.arguments {
            write!(f, " {}", argument)?;
        }
        write_transitions(f, &self.transitions)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}=", self.key)?;
        if !self.value.is_empty() && self.value.chars().all(is_argument_value_char) {
            write!(f, "{}", self.value)
        } else {
            write_quoted(f, &self.value)
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_label(f, &self.label)?;
        write!(f, "<")?;
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            write!(f, "{}", branch)?;
        }
        write!(f, ">")?;
        write_transitions(f, &self.transitions)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.on_exit, self.target)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Wildcard => write!(f, "*"),
            ExitStatus::Code(code) => write_quoted(f, code),
        }
    }
}
