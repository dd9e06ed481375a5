//! Reconstruction of DSL text from a [`Graph`].
//!
//! The default flow is walked from `START`. A node with one successor
//! continues the current sequence and a node with several successors opens
//! a split. Split branches are followed up to the first join, a node with
//! several incoming default links, or `END`. Branches that account for all
//! of a join's incoming links are merged into a split, innermost join first,
//! so nested splits come back out nested.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use taskgraph_core::graph::{END_ID, Graph, Node, START_ID};
use taskgraph_parser::{
    Diagnostic, ErrorCode, Spanned,
    ast::{Argument, ComposedTask, ExitStatus, Sequence, Split, Step, TaskApp, Transition},
};

use super::{check::check_indexed, index::GraphIndex};

/// Render a graph as canonical DSL text.
///
/// # Errors
///
/// Returns the first problem found by [`check`](fn@super::check), or an
/// `E305` diagnostic when the default flow does not nest into splits and
/// sequences.
pub fn to_dsl_text(graph: &Graph) -> Result<String, Diagnostic> {
    let index = GraphIndex::new(graph);
    check_indexed(graph, &index)?;

    let task = Generator::new(graph, index).task()?;
    trace!(task:?; "Reconstructed task definition");

    let text = task.to_string();
    debug!(nodes = graph.nodes().len(), length = text.len(); "Generated task definition");
    Ok(text)
}

fn structure_error(message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message).with_code(ErrorCode::E305)
}

fn synthesized(text: &str) -> Spanned<String> {
    Spanned::synthesized(text.to_string())
}

fn split_step(
    branches: Vec<Sequence>,
    label: Option<Spanned<String>>,
    transitions: Vec<Spanned<Transition>>,
) -> Step {
    Step::Split(Spanned::synthesized(Split {
        label,
        branches,
        transitions,
    }))
}

/// Pick a label for `name` that no other node uses.
fn fresh_label(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut suffix = 1;
    while used.contains(&candidate) {
        candidate = format!("{name}-{suffix}");
        suffix += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Steps walked from some node up to the join or `END` where they stop.
struct Walk<'a> {
    steps: Vec<Step>,
    terminal: &'a str,
    /// Incoming default links of `terminal` this walk accounts for
    arrivals: usize,
}

impl Walk<'_> {
    fn prepend(mut self, mut prefix: Vec<Step>) -> Self {
        prefix.append(&mut self.steps);
        self.steps = prefix;
        self
    }

    fn into_sequence(self) -> Sequence {
        Sequence::new(self.steps)
    }
}

/// Outcome of gathering split branches.
enum Closed<'a> {
    /// The split and its join are built; the flow goes on after `join`.
    Joined { steps: Vec<Step>, join: &'a str },
    /// The branches stop at `END`, or at a join that other branches of an
    /// enclosing split also reach.
    Arrived(Walk<'a>),
}

struct Generator<'a> {
    graph: &'a Graph,
    index: GraphIndex<'a>,
    /// Node id to label, including labels made up for unlabelled targets
    labels: HashMap<&'a str, String>,
    visited: HashSet<&'a str>,
}

impl<'a> Generator<'a> {
    fn new(graph: &'a Graph, index: GraphIndex<'a>) -> Self {
        let targets: HashSet<&str> = graph
            .links()
            .iter()
            .filter(|link| !link.is_default())
            .map(|link| link.to())
            .collect();
        let mut used: HashSet<String> = graph
            .nodes()
            .iter()
            .filter_map(Node::label)
            .map(str::to_string)
            .collect();

        let mut labels = HashMap::new();
        for node in graph.nodes() {
            match node.label() {
                Some(label) => {
                    labels.insert(node.id(), label.to_string());
                }
                None if node.is_task() && targets.contains(node.id()) => {
                    labels.insert(node.id(), fresh_label(node.name(), &mut used));
                }
                None => {}
            }
        }

        Self {
            graph,
            index,
            labels,
            visited: HashSet::new(),
        }
    }

    fn task(mut self) -> Result<ComposedTask, Diagnostic> {
        let walk = self.continue_after(START_ID)?;
        if walk.terminal != END_ID {
            return Err(structure_error(format!(
                "default flow from START stops at join `{}`",
                walk.terminal
            )));
        }
        if let Some(node) = self
            .graph
            .nodes()
            .iter()
            .find(|node| node.is_task() && !self.visited.contains(node.id()))
        {
            return Err(structure_error(format!(
                "node `{}` is not part of the default flow",
                node.id()
            )));
        }

        Ok(ComposedTask::new("", walk.into_sequence()))
    }

    fn node(&self, id: &str) -> Result<&'a Node, Diagnostic> {
        self.index.node(id).ok_or_else(|| {
            Diagnostic::error(format!("unknown node `{id}`")).with_code(ErrorCode::E302)
        })
    }

    fn is_join(&self, id: &str) -> bool {
        self.index.in_degree(id) > 1
    }

    fn visit(&mut self, id: &'a str) -> Result<(), Diagnostic> {
        if self.visited.insert(id) {
            Ok(())
        } else {
            Err(structure_error(format!(
                "node `{id}` is reached along more than one path"
            )))
        }
    }

    fn label(&self, id: &str) -> Option<Spanned<String>> {
        self.labels.get(id).map(|label| synthesized(label))
    }

    fn transitions(&self, id: &str) -> Result<Vec<Spanned<Transition>>, Diagnostic> {
        self.index
            .transitions(id)
            .map(|link| -> Result<Spanned<Transition>, Diagnostic> {
                let target = if link.to() == END_ID {
                    END_ID.to_string()
                } else {
                    self.labels.get(link.to()).cloned().ok_or_else(|| {
                        Diagnostic::error(format!(
                            "transition from `{id}` targets node `{}`, which cannot be labelled",
                            link.to()
                        ))
                        .with_code(ErrorCode::E307)
                    })?
                };
                Ok(Spanned::synthesized(Transition {
                    on_exit: Spanned::synthesized(ExitStatus::Code(link.exit_status().to_string())),
                    target: Spanned::synthesized(target),
                }))
            })
            .collect()
    }

    fn task_step(&self, node: &Node) -> Result<Step, Diagnostic> {
        let mut app = TaskApp::new(synthesized(node.name()));
        app.label = self.label(node.id());
        app.arguments = node
            .properties()
            .iter()
            .map(|(key, value)| Argument {
                key: synthesized(key),
                value: synthesized(value),
            })
            .collect();
        app.transitions = self.transitions(node.id())?;
        Ok(Step::TaskApp(Spanned::synthesized(app)))
    }

    /// Mark `id` visited and build its step. A pass-through `SYNC` has none.
    fn enter(&mut self, id: &'a str) -> Result<Option<Step>, Diagnostic> {
        let node = self.node(id)?;
        self.visit(id)?;
        if node.is_sync() {
            return Ok(None);
        }
        self.task_step(node).map(Some)
    }

    /// Walk the flow leaving `id`.
    ///
    /// Sequences are followed in a loop; only splits recurse, so the depth
    /// is bounded by split nesting rather than by the length of the graph.
    fn continue_after(&mut self, id: &'a str) -> Result<Walk<'a>, Diagnostic> {
        let mut steps = Vec::new();
        let mut current = id;

        loop {
            let successors = self.index.successors(current);
            match successors.as_slice() {
                [] => {
                    return Err(structure_error(format!(
                        "node `{current}` has no default link"
                    )));
                }
                [next] => {
                    let next = *next;
                    if next == END_ID || self.is_join(next) {
                        return Ok(Walk {
                            steps,
                            terminal: next,
                            arrivals: 1,
                        });
                    }
                    steps.extend(self.enter(next)?);
                    current = next;
                }
                _ => match self.split_from(&successors)? {
                    Closed::Joined {
                        steps: split,
                        join,
                    } => {
                        steps.extend(split);
                        current = join;
                    }
                    Closed::Arrived(walk) => return Ok(walk.prepend(steps)),
                },
            }
        }
    }

    /// Walk from a split branch head.
    fn branch_from(&mut self, head: &'a str) -> Result<Walk<'a>, Diagnostic> {
        if head == END_ID || self.is_join(head) {
            return Err(structure_error(format!(
                "split branch has no steps before `{head}`"
            )));
        }
        let first: Vec<Step> = self.enter(head)?.into_iter().collect();
        let walk = self.continue_after(head)?.prepend(first);
        if walk.steps.is_empty() {
            return Err(structure_error(format!(
                "split branch through `{head}` has no steps"
            )));
        }
        Ok(walk)
    }

    fn split_from(&mut self, heads: &[&'a str]) -> Result<Closed<'a>, Diagnostic> {
        trace!(heads:?; "Opening split");
        let mut pending = heads
            .iter()
            .map(|&head| self.branch_from(head))
            .collect::<Result<Vec<_>, _>>()?;

        loop {
            let terminal = pending[0].terminal;
            if pending.iter().all(|walk| walk.terminal == terminal) {
                let arrivals: usize = pending.iter().map(|walk| walk.arrivals).sum();
                let branches = pending.into_iter().map(Walk::into_sequence).collect();
                if terminal == END_ID || arrivals == self.index.in_degree(terminal) {
                    return self.close_split(branches, terminal);
                }
                return Ok(Closed::Arrived(Walk {
                    steps: vec![split_step(branches, None, Vec::new())],
                    terminal,
                    arrivals,
                }));
            }

            let Some(join) = self.mergeable_join(&pending) else {
                return Err(structure_error(format!(
                    "split branches meeting at `{terminal}` do not nest"
                )));
            };

            let position = pending
                .iter()
                .position(|walk| walk.terminal == join)
                .unwrap_or(0);
            let (group, rest): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|walk| walk.terminal == join);
            let branches = group.into_iter().map(Walk::into_sequence).collect();

            pending = rest;
            let merged = match self.close_split(branches, join)? {
                Closed::Joined { steps, join } => self.continue_after(join)?.prepend(steps),
                Closed::Arrived(walk) => walk,
            };
            pending.insert(position, merged);
        }
    }

    /// A join other than `END` reached by two or more pending branches that
    /// account for all of its incoming links.
    fn mergeable_join(&self, pending: &[Walk<'a>]) -> Option<&'a str> {
        pending
            .iter()
            .map(|walk| walk.terminal)
            .filter(|&terminal| terminal != END_ID)
            .find(|&terminal| {
                let group = pending.iter().filter(|walk| walk.terminal == terminal);
                let (count, arrivals) = group.fold((0, 0), |(count, arrivals), walk| {
                    (count + 1, arrivals + walk.arrivals)
                });
                count >= 2 && arrivals == self.index.in_degree(terminal)
            })
    }

    /// Build the split whose branches all stop at `join`, together with the
    /// join itself.
    fn close_split(
        &mut self,
        branches: Vec<Sequence>,
        join: &'a str,
    ) -> Result<Closed<'a>, Diagnostic> {
        if join == END_ID {
            return Ok(Closed::Arrived(Walk {
                steps: vec![split_step(branches, None, Vec::new())],
                terminal: END_ID,
                arrivals: 1,
            }));
        }

        let node = self.node(join)?;
        self.visit(join)?;
        let steps = if node.is_sync() {
            vec![split_step(branches, self.label(join), self.transitions(join)?)]
        } else {
            vec![split_step(branches, None, Vec::new()), self.task_step(node)?]
        };
        Ok(Closed::Joined { steps, join })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use taskgraph_core::graph::Link;

    use crate::graph::to_graph;
    use taskgraph_parser::{ParserConfig, parse};

    fn round_trip(source: &str) -> String {
        let task = parse("test", source, &ParserConfig::default()).unwrap();
        to_dsl_text(&to_graph(&task)).unwrap()
    }

    #[test]
    fn test_sequence() {
        assert_eq!(round_trip("foo && bar --k=v"), "foo && bar --k=v");
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(round_trip(""), "");
    }

    #[test]
    fn test_splits() {
        assert_eq!(round_trip("<foo || bar> && baz"), "<foo || bar> && baz");
        assert_eq!(round_trip("<<a || b> || c>"), "<<a || b> || c>");
        assert_eq!(round_trip("<a && <b || c> || d>"), "<a && <b || c> || d>");
        assert_eq!(
            round_trip("<<a || b> && e || c> && <x || y || z>"),
            "<<a || b> && e || c> && <x || y || z>"
        );
    }

    #[test]
    fn test_labels_and_transitions() {
        let source = "s: <a 'ERR' -> c || b> '1' -> END && c: cleanup --to='a b'";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn test_unlabelled_transition_target_gets_label() {
        let graph = Graph::new(
            vec![
                Node::start(),
                Node::new("0", "foo").with_label("foo"),
                Node::new("1", "foo"),
                Node::end(),
            ],
            vec![
                Link::new("START", "0"),
                Link::new("0", "1").with_exit_status("FAILED"),
                Link::new("0", "1"),
                Link::new("1", "END"),
            ],
        );

        assert_eq!(
            to_dsl_text(&graph).unwrap(),
            "foo: foo 'FAILED' -> foo-1 && foo-1: foo"
        );
    }

    #[test]
    fn test_task_node_as_join() {
        let graph = Graph::new(
            vec![
                Node::start(),
                Node::new("a", "a"),
                Node::new("b", "b"),
                Node::new("c", "c"),
                Node::end(),
            ],
            vec![
                Link::new("START", "a"),
                Link::new("START", "b"),
                Link::new("a", "c"),
                Link::new("b", "c"),
                Link::new("c", "END"),
            ],
        );

        assert_eq!(to_dsl_text(&graph).unwrap(), "<a || b> && c");
    }

    #[test]
    fn test_branches_ending_at_end() {
        let graph = Graph::new(
            vec![Node::start(), Node::new("a", "a"), Node::new("b", "b"), Node::end()],
            vec![
                Link::new("START", "a"),
                Link::new("START", "b"),
                Link::new("a", "END"),
                Link::new("b", "END"),
            ],
        );

        assert_eq!(to_dsl_text(&graph).unwrap(), "<a || b>");
    }

    #[test]
    fn test_pass_through_sync() {
        let graph = Graph::new(
            vec![Node::start(), Node::new("0", "a"), Node::sync("1"), Node::end()],
            vec![
                Link::new("START", "0"),
                Link::new("0", "1"),
                Link::new("1", "END"),
            ],
        );

        assert_eq!(to_dsl_text(&graph).unwrap(), "a");
    }

    #[test]
    fn test_labelled_pass_through_sync_is_rejected() {
        let graph = Graph::new(
            vec![
                Node::start(),
                Node::new("0", "a"),
                Node::sync("1").with_label("keep"),
                Node::end(),
            ],
            vec![
                Link::new("START", "0"),
                Link::new("0", "1"),
                Link::new("1", "END"),
            ],
        );

        let err = to_dsl_text(&graph).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E308));
    }

    /// Builds `START -> 0 -> 1 -> ... -> END` with `count` task nodes.
    fn chain(count: usize) -> (Vec<Node>, Vec<Link>) {
        let mut nodes = vec![Node::start()];
        nodes.extend((0..count).map(|n| Node::new(n.to_string(), "app")));
        nodes.push(Node::end());

        let mut links = vec![Link::new("START", "0")];
        links.extend((1..count).map(|n| Link::new((n - 1).to_string(), n.to_string())));
        links.push(Link::new((count - 1).to_string(), "END"));
        (nodes, links)
    }

    #[test]
    fn test_long_sequence() {
        let (nodes, links) = chain(20_000);

        let text = to_dsl_text(&Graph::new(nodes, links)).unwrap();
        assert_eq!(text.matches("app").count(), 20_000);
        assert!(text.starts_with("app && app && "));
    }

    #[test]
    fn test_long_sequence_inside_split() {
        let (mut nodes, mut links) = chain(20_000);
        nodes.insert(1, Node::new("x", "other"));
        links.push(Link::new("START", "x"));
        links.push(Link::new("x", "END"));

        let text = to_dsl_text(&Graph::new(nodes, links)).unwrap();
        assert!(text.starts_with("<app && app && "));
        assert!(text.ends_with("app || other>"));
    }

    #[test]
    fn test_empty_branch_is_rejected() {
        let graph = Graph::new(
            vec![Node::start(), Node::new("0", "a"), Node::end()],
            vec![
                Link::new("START", "0"),
                Link::new("START", "END"),
                Link::new("0", "END"),
            ],
        );

        let err = to_dsl_text(&graph).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E305));
    }

    #[test]
    fn test_crossing_branches_are_rejected() {
        // a and b both fan out to the same pair of joins
        let graph = Graph::new(
            vec![
                Node::start(),
                Node::new("a", "a"),
                Node::new("b", "b"),
                Node::new("c", "c"),
                Node::new("d", "d"),
                Node::end(),
            ],
            vec![
                Link::new("START", "a"),
                Link::new("START", "b"),
                Link::new("a", "c"),
                Link::new("a", "d"),
                Link::new("b", "c"),
                Link::new("b", "d"),
                Link::new("c", "END"),
                Link::new("d", "END"),
            ],
        );

        let err = to_dsl_text(&graph).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E305));
    }

    #[test]
    fn test_check_failure_is_returned() {
        let graph = Graph::new(vec![Node::new("0", "a"), Node::end()], vec![]);

        let err = to_dsl_text(&graph).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E300));
    }
}
