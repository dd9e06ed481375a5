//! Semantic validation of a parsed task definition.
//!
//! Every rule is a function from the tree to the problems it finds, so all
//! problems are reported in one pass instead of stopping at the first.
//!
//! ## Validations Performed
//!
//! - **Labels**: transition targets must be defined labels of task apps (or
//!   `END`), labels must be unique and must not be `START` or `END`
//! - **Splits**: a split needs at least two branches
//! - **Transitions**: no `*` status, no status repeated on one step
//! - **Task apps**: no repeated argument key, no reserved node name
//! - **Task name**: bounded length when enabled in [`ParserConfig`]

use std::collections::{HashMap, HashSet};

use log::debug;
use taskgraph_core::graph::{END_ID, START_ID, SYNC_NAME};

use crate::{
    ast::{ComposedTask, ExitStatus, Step},
    config::ParserConfig,
    error::{Diagnostic, ErrorCode},
    span::Span,
};

const RESERVED_LABELS: [&str; 2] = [START_ID, END_ID];
const RESERVED_APP_NAMES: [&str; 3] = [START_ID, END_ID, SYNC_NAME];

/// Steps by label, first definition wins. Reserved labels are left out.
struct Labels<'a> {
    defined: HashMap<&'a str, &'a Step>,
}

impl<'a> Labels<'a> {
    fn new(steps: &[&'a Step]) -> Self {
        let mut defined = HashMap::new();
        for &step in steps {
            if let Some(label) = step.label() {
                if !RESERVED_LABELS.contains(&label.as_str()) {
                    defined.entry(label.as_str()).or_insert(step);
                }
            }
        }
        Self { defined }
    }

    fn get(&self, label: &str) -> Option<&'a Step> {
        self.defined.get(label).copied()
    }
}

/// Validate a parsed task definition.
///
/// Returns every problem found, ordered by source position; problems with no
/// source position come first. An empty vector means the definition is
/// valid.
pub fn validate(task: &ComposedTask, config: &ParserConfig) -> Vec<Diagnostic> {
    let steps = task.walk();
    let labels = Labels::new(&steps);

    let mut diagnostics = Vec::new();
    diagnostics.extend(task_name_length(task, config));
    diagnostics.extend(undefined_targets(&steps, &labels));
    diagnostics.extend(split_targets(&steps, &labels));
    diagnostics.extend(duplicate_labels(&steps));
    diagnostics.extend(reserved_labels(&steps));
    diagnostics.extend(single_branch_splits(&steps));
    diagnostics.extend(wildcard_transitions(&steps));
    diagnostics.extend(duplicate_exit_statuses(&steps));
    diagnostics.extend(duplicate_arguments(&steps));
    diagnostics.extend(reserved_app_names(&steps));

    diagnostics.sort_by_key(|diagnostic| {
        diagnostic
            .primary_span()
            .map(|span| (span.start(), span.end()))
    });

    debug!(name = task.name.as_str(), problems = diagnostics.len(); "Validated task definition");
    diagnostics
}

fn task_name_length(task: &ComposedTask, config: &ParserConfig) -> Vec<Diagnostic> {
    let length = task.name.chars().count();
    if !config.validate_task_name_length || length <= config.max_task_name_length {
        return Vec::new();
    }

    vec![
        Diagnostic::error(format!(
            "task name `{}` is {length} characters long, the limit is {}",
            task.name, config.max_task_name_length
        ))
        .with_code(ErrorCode::E203),
    ]
}

fn undefined_targets(steps: &[&Step], labels: &Labels<'_>) -> Vec<Diagnostic> {
    steps
        .iter()
        .flat_map(|step| step.transitions())
        .map(|transition| &transition.target)
        .filter(|target| target.as_str() != END_ID && labels.get(target).is_none())
        .map(|target| {
            Diagnostic::error(format!("undefined label `{target}`"))
                .with_code(ErrorCode::E200)
                .with_label(target.span(), "no step has this label")
                .with_help(format!("label a task app with `{target}: <app>` or target `END`"))
        })
        .collect()
}

fn split_targets(steps: &[&Step], labels: &Labels<'_>) -> Vec<Diagnostic> {
    steps
        .iter()
        .flat_map(|step| step.transitions())
        .filter_map(|transition| {
            let target = &transition.target;
            match labels.get(target)? {
                Step::Split(split) => Some(
                    Diagnostic::error(format!("transition targets split `{target}`"))
                        .with_code(ErrorCode::E205)
                        .with_label(target.span(), "labels a split")
                        .with_secondary_label(split.span(), "split defined here")
                        .with_help("transitions can only target task apps"),
                ),
                Step::TaskApp(_) => None,
            }
        })
        .collect()
}

fn duplicate_labels(steps: &[&Step]) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<&str, Span> = HashMap::new();
    let mut diagnostics = Vec::new();

    for label in steps.iter().filter_map(|step| step.label()) {
        if RESERVED_LABELS.contains(&label.as_str()) {
            continue;
        }
        match first_seen.get(label.as_str()) {
            Some(first) => diagnostics.push(
                Diagnostic::error(format!("label `{label}` is defined multiple times"))
                    .with_code(ErrorCode::E201)
                    .with_label(label.span(), "duplicate label")
                    .with_secondary_label(*first, "first defined here")
                    .with_help("labels must be unique within a task"),
            ),
            None => {
                first_seen.insert(label.as_str(), label.span());
            }
        }
    }

    diagnostics
}

fn reserved_labels(steps: &[&Step]) -> Vec<Diagnostic> {
    steps
        .iter()
        .filter_map(|step| step.label())
        .filter(|label| RESERVED_LABELS.contains(&label.as_str()))
        .map(|label| {
            Diagnostic::error(format!("`{label}` is reserved and cannot be used as a label"))
                .with_code(ErrorCode::E204)
                .with_label(label.span(), "reserved name")
        })
        .collect()
}

fn single_branch_splits(steps: &[&Step]) -> Vec<Diagnostic> {
    steps
        .iter()
        .filter_map(|step| match step {
            Step::Split(split) if split.branches.len() < 2 => Some(
                Diagnostic::error("split has a single branch")
                    .with_code(ErrorCode::E202)
                    .with_label(split.span(), "only one branch")
                    .with_help("add another branch with `||` or remove the `<` and `>`"),
            ),
            _ => None,
        })
        .collect()
}

fn wildcard_transitions(steps: &[&Step]) -> Vec<Diagnostic> {
    steps
        .iter()
        .flat_map(|step| step.transitions())
        .filter(|transition| *transition.on_exit.inner() == ExitStatus::Wildcard)
        .map(|transition| {
            Diagnostic::error("`*` cannot be used as a transition exit status")
                .with_code(ErrorCode::E206)
                .with_label(transition.on_exit.span(), "wildcard status")
                .with_help("`*` is the default flow; use `&&` to continue with the next step")
        })
        .collect()
}

fn duplicate_exit_statuses(steps: &[&Step]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for step in steps {
        let mut seen = HashSet::new();
        for transition in step.transitions() {
            let status = transition.on_exit.inner();
            if *status == ExitStatus::Wildcard || seen.insert(status) {
                continue;
            }
            diagnostics.push(
                Diagnostic::error(format!(
                    "exit status {status} is handled more than once by the same step"
                ))
                .with_code(ErrorCode::E207)
                .with_label(transition.on_exit.span(), "duplicate exit status"),
            );
        }
    }

    diagnostics
}

fn duplicate_arguments(steps: &[&Step]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for step in steps {
        let Step::TaskApp(app) = step else {
            continue;
        };
        let mut first_seen: HashMap<&str, Span> = HashMap::new();
        for argument in &app.arguments {
            match first_seen.get(argument.key.as_str()) {
                Some(first) => diagnostics.push(
                    Diagnostic::error(format!(
                        "argument `--{}` is given more than once to `{}`",
                        argument.key, app.name
                    ))
                    .with_code(ErrorCode::E208)
                    .with_label(argument.key.span(), "duplicate argument")
                    .with_secondary_label(*first, "first given here"),
                ),
                None => {
                    first_seen.insert(argument.key.as_str(), argument.key.span());
                }
            }
        }
    }

    diagnostics
}

fn reserved_app_names(steps: &[&Step]) -> Vec<Diagnostic> {
    steps
        .iter()
        .filter_map(|step| match step {
            Step::TaskApp(app) if RESERVED_APP_NAMES.contains(&app.name.as_str()) => Some(
                Diagnostic::error(format!(
                    "`{}` is a reserved node name and cannot name a task app",
                    app.name
                ))
                .with_code(ErrorCode::E209)
                .with_label(app.name.span(), "reserved name"),
            ),
            _ => None,
        })
        .collect()
}
