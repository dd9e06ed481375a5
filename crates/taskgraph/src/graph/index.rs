//! Lookup tables over a [`Graph`], built once per conversion.

use std::collections::HashMap;

use taskgraph_core::graph::{Graph, Link, Node};

/// Node and link lookups by node id.
///
/// When ids repeat, the first node with an id is the one found.
pub(crate) struct GraphIndex<'a> {
    nodes: HashMap<&'a str, &'a Node>,
    outgoing: HashMap<&'a str, Vec<&'a Link>>,
    incoming: HashMap<&'a str, Vec<&'a Link>>,
    /// Default-flow links entering each node
    in_degrees: HashMap<&'a str, usize>,
}

impl<'a> GraphIndex<'a> {
    pub(crate) fn new(graph: &'a Graph) -> Self {
        let mut nodes = HashMap::with_capacity(graph.nodes().len());
        for node in graph.nodes() {
            nodes.entry(node.id()).or_insert(node);
        }

        let mut outgoing: HashMap<&str, Vec<&Link>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Link>> = HashMap::new();
        let mut in_degrees = HashMap::new();
        for link in graph.links() {
            outgoing.entry(link.from()).or_default().push(link);
            incoming.entry(link.to()).or_default().push(link);
            if link.is_default() {
                *in_degrees.entry(link.to()).or_insert(0) += 1;
            }
        }

        Self {
            nodes,
            outgoing,
            incoming,
            in_degrees,
        }
    }

    pub(crate) fn node(&self, id: &str) -> Option<&'a Node> {
        self.nodes.get(id).copied()
    }

    /// Links leaving `id`, in declaration order.
    pub(crate) fn outgoing(&self, id: &str) -> &[&'a Link] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Links entering `id`, in declaration order.
    pub(crate) fn incoming(&self, id: &str) -> &[&'a Link] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Targets of the default links leaving `id`, in declaration order.
    pub(crate) fn successors(&self, id: &str) -> Vec<&'a str> {
        self.outgoing(id)
            .iter()
            .filter(|link| link.is_default())
            .map(|link| link.to())
            .collect()
    }

    /// Non-default links leaving `id`, in declaration order.
    pub(crate) fn transitions(&self, id: &str) -> impl Iterator<Item = &'a Link> + '_ {
        self.outgoing(id)
            .iter()
            .copied()
            .filter(|link| !link.is_default())
    }

    pub(crate) fn in_degree(&self, id: &str) -> usize {
        self.in_degrees.get(id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let graph = Graph::new(
            vec![Node::start(), Node::new("0", "a"), Node::new("1", "b"), Node::end()],
            vec![
                Link::new("START", "0"),
                Link::new("0", "END").with_exit_status("FAILED"),
                Link::new("0", "1"),
                Link::new("1", "END"),
            ],
        );
        let index = GraphIndex::new(&graph);

        assert_eq!(index.node("1").map(Node::name), Some("b"));
        assert!(index.node("7").is_none());
        assert_eq!(index.successors("0"), vec!["1"]);
        assert_eq!(
            index.transitions("0").map(Link::exit_status).collect::<Vec<_>>(),
            vec!["FAILED"]
        );
        assert_eq!(index.incoming("END").len(), 2);
        assert_eq!(index.in_degree("END"), 1);
        assert!(index.outgoing("END").is_empty());
    }

    #[test]
    fn test_first_node_wins_for_repeated_id() {
        let graph = Graph::new(vec![Node::new("0", "a"), Node::new("0", "b")], vec![]);

        assert_eq!(GraphIndex::new(&graph).node("0").map(Node::name), Some("a"));
    }
}
