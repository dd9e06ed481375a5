//! Lowering of a parsed definition into a [`Graph`].

use std::collections::HashMap;

use log::{debug, warn};

use taskgraph_core::graph::{END_ID, Graph, Link, Node, START_ID};
use taskgraph_parser::{
    Spanned,
    ast::{ComposedTask, Sequence, Split, Step, TaskApp, Transition},
};

/// Build the graph of a composed task.
///
/// Task apps become nodes with sequential ids in textual order; each split
/// closes with a `SYNC` node that takes the next id. The definition should
/// have passed validation: a transition whose target label is unknown is
/// dropped.
pub fn to_graph(task: &ComposedTask) -> Graph {
    let mut synthesizer = Synthesizer::default();
    let tail = synthesizer.sequence(&task.sequence, START_ID.to_string());
    synthesizer.link(tail, END_ID.to_string());

    let graph = synthesizer.finish();
    debug!(
        task = task.name.as_str(),
        nodes = graph.nodes().len(),
        links = graph.links().len();
        "Synthesized task graph"
    );
    graph
}

#[derive(Default)]
struct Synthesizer<'a> {
    nodes: Vec<Node>,
    /// Default-flow successors, in creation order
    defaults: HashMap<String, Vec<String>>,
    transitions: HashMap<String, &'a [Spanned<Transition>]>,
    /// Label to node id; the first definition wins
    labels: HashMap<&'a str, String>,
    next_id: usize,
}

impl<'a> Synthesizer<'a> {
    fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    fn link(&mut self, from: String, to: String) {
        self.defaults.entry(from).or_default().push(to);
    }

    /// Lower `sequence` after the node `tail`, returning the new tail.
    fn sequence(&mut self, sequence: &'a Sequence, tail: String) -> String {
        sequence
            .steps
            .iter()
            .fold(tail, |tail, step| self.step(step, tail))
    }

    fn step(&mut self, step: &'a Step, tail: String) -> String {
        let id = match step {
            Step::TaskApp(app) => self.task_app(app, tail),
            Step::Split(split) => self.split(split, tail),
        };

        if let Some(label) = step.label() {
            self.labels
                .entry(label.as_str())
                .or_insert_with(|| id.clone());
        }
        let transitions = step.transitions();
        if !transitions.is_empty() {
            self.transitions.insert(id.clone(), transitions);
        }
        id
    }

    fn task_app(&mut self, app: &'a TaskApp, tail: String) -> String {
        let id = self.allocate_id();

        let mut node = Node::new(id.clone(), app.name.as_str());
        if let Some(label) = &app.label {
            node = node.with_label(label.as_str());
        }
        for argument in &app.arguments {
            node = node.with_property(argument.key.as_str(), argument.value.as_str());
        }

        self.nodes.push(node);
        self.link(tail, id.clone());
        id
    }

    fn split(&mut self, split: &'a Split, tail: String) -> String {
        let branch_tails: Vec<String> = split
            .branches
            .iter()
            .map(|branch| self.sequence(branch, tail.clone()))
            .collect();

        let id = self.allocate_id();
        let mut node = Node::sync(id.clone());
        if let Some(label) = &split.label {
            node = node.with_label(label.as_str());
        }
        self.nodes.push(node);

        for branch_tail in branch_tails {
            self.link(branch_tail, id.clone());
        }
        id
    }

    /// Emit the nodes between the sentinels and, per node, its transition
    /// links ahead of its default links.
    fn finish(mut self) -> Graph {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 2);
        nodes.push(Node::start());
        nodes.append(&mut self.nodes);
        nodes.push(Node::end());

        let mut links = Vec::new();
        for node in &nodes {
            let id = node.id();

            for transition in self.transitions.get(id).copied().unwrap_or_default() {
                let target = transition.target.as_str();
                let to = if target == END_ID {
                    Some(END_ID.to_string())
                } else {
                    self.labels.get(target).cloned()
                };
                match to {
                    Some(to) => links.push(
                        Link::new(id, to).with_exit_status(transition.on_exit.as_str()),
                    ),
                    None => {
                        warn!(node = id, label = target; "Dropping transition to undefined label")
                    }
                }
            }

            for to in self.defaults.remove(id).unwrap_or_default() {
                links.push(Link::new(id, to));
            }
        }

        Graph::new(nodes, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use taskgraph_parser::{ParserConfig, parse};

    fn graph_of(source: &str) -> Graph {
        to_graph(&parse("test", source, &ParserConfig::default()).unwrap())
    }

    fn link_triples(graph: &Graph) -> Vec<(&str, &str, &str)> {
        graph
            .links()
            .iter()
            .map(|link| (link.from(), link.to(), link.exit_status()))
            .collect()
    }

    #[test]
    fn test_sequence() {
        let graph = graph_of("foo && bar");

        let nodes: Vec<(&str, &str)> = graph.nodes().iter().map(|n| (n.id(), n.name())).collect();
        assert_eq!(
            nodes,
            vec![("START", "START"), ("0", "foo"), ("1", "bar"), ("END", "END")]
        );
        assert_eq!(
            link_triples(&graph),
            vec![("START", "0", "*"), ("0", "1", "*"), ("1", "END", "*")]
        );
    }

    #[test]
    fn test_empty_task() {
        let graph = graph_of("");

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(link_triples(&graph), vec![("START", "END", "*")]);
    }

    #[test]
    fn test_split_closes_with_sync() {
        let graph = graph_of("<foo || bar> && baz");

        let nodes: Vec<(&str, &str)> = graph.nodes().iter().map(|n| (n.id(), n.name())).collect();
        assert_eq!(
            nodes,
            vec![
                ("START", "START"),
                ("0", "foo"),
                ("1", "bar"),
                ("2", "SYNC"),
                ("3", "baz"),
                ("END", "END"),
            ]
        );
        assert_eq!(
            link_triples(&graph),
            vec![
                ("START", "0", "*"),
                ("START", "1", "*"),
                ("0", "2", "*"),
                ("1", "2", "*"),
                ("2", "3", "*"),
                ("3", "END", "*"),
            ]
        );
    }

    #[test]
    fn test_nested_split_at_branch_head_fans_from_outer_tail() {
        let graph = graph_of("<<a || b> || c>");

        assert_eq!(
            link_triples(&graph),
            vec![
                ("START", "0", "*"),
                ("START", "1", "*"),
                ("START", "3", "*"),
                ("0", "2", "*"),
                ("1", "2", "*"),
                ("2", "4", "*"),
                ("3", "4", "*"),
                ("4", "END", "*"),
            ]
        );
    }

    #[test]
    fn test_transitions_precede_default_links() {
        let graph = graph_of("foo 'FAILED' -> c '0' -> END && bar && c: cleanup");

        assert_eq!(
            link_triples(&graph),
            vec![
                ("START", "0", "*"),
                ("0", "2", "FAILED"),
                ("0", "END", "0"),
                ("0", "1", "*"),
                ("1", "2", "*"),
                ("2", "END", "*"),
            ]
        );
        assert_eq!(graph.node("2").and_then(Node::label), Some("c"));
    }

    #[test]
    fn test_split_label_and_transitions_move_to_sync() {
        let graph = graph_of("s: <a || b> 'ERR' -> END");

        let sync = graph.node("2").unwrap();
        assert!(sync.is_sync());
        assert_eq!(sync.label(), Some("s"));
        assert_eq!(graph.outgoing("2").next().map(Link::exit_status), Some("ERR"));
    }

    #[test]
    fn test_arguments_become_ordered_properties() {
        let graph = graph_of("http --url=x --method='POST'");

        let properties: Vec<(&str, &str)> = graph.nodes()[1]
            .properties()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(properties, vec![("url", "x"), ("method", "POST")]);
    }

    #[test]
    fn test_unresolved_transition_is_dropped() {
        let graph = graph_of("foo 'X' -> nowhere");

        assert_eq!(
            link_triples(&graph),
            vec![("START", "0", "*"), ("0", "END", "*")]
        );
    }
}
