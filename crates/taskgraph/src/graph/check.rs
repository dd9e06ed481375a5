//! Well-formedness checks run before a graph is turned back into text.
//!
//! Each check returns the first problem it finds. Graph problems have no
//! source text to point at, so the diagnostics carry no labels.

use std::collections::{HashMap, HashSet};

use petgraph::{
    algo::toposort,
    graph::{DiGraph, NodeIndex},
    visit::Dfs,
};

use taskgraph_core::graph::{END_ID, Graph, Link, Node, START_ID, SYNC_NAME};
use taskgraph_parser::{
    Diagnostic, ErrorCode,
    lexer::tokenize,
    tokens::TokenKind,
};

use super::index::GraphIndex;

/// Run every check, stopping at the first failure.
pub fn check(graph: &Graph) -> Result<(), Diagnostic> {
    check_indexed(graph, &GraphIndex::new(graph))
}

/// [`check`] with lookup tables the caller already built.
pub(crate) fn check_indexed(graph: &Graph, index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    unique_ids(graph)?;
    sentinels_present(index)?;
    endpoints_resolve(graph, index)?;
    sentinel_links(index)?;
    no_conflicting_links(graph)?;
    transition_endpoints(graph, index)?;
    pass_through_syncs(graph, index)?;
    expressible(graph)?;
    default_flow(graph, index)?;
    Ok(())
}

fn graph_error(code: ErrorCode, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message).with_code(code)
}

/// Returns `true` if `text` lexes as exactly one identifier.
fn is_identifier(text: &str) -> bool {
    let tokens = tokenize(text);
    matches!(
        tokens.as_slice(),
        [name, eof] if name.is(TokenKind::Identifier) && name.text == text && eof.is(TokenKind::Eof)
    )
}

fn unique_ids(graph: &Graph) -> Result<(), Diagnostic> {
    let mut seen = HashSet::new();
    match graph.nodes().iter().find(|node| !seen.insert(node.id())) {
        Some(node) => Err(graph_error(
            ErrorCode::E306,
            format!("node id `{}` is used more than once", node.id()),
        )),
        None => Ok(()),
    }
}

fn sentinels_present(index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    if index.node(START_ID).is_none() {
        return Err(graph_error(ErrorCode::E300, "graph has no START node"));
    }
    if index.node(END_ID).is_none() {
        return Err(graph_error(ErrorCode::E301, "graph has no END node"));
    }
    Ok(())
}

fn endpoints_resolve(graph: &Graph, index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    for link in graph.links() {
        for endpoint in [link.from(), link.to()] {
            if index.node(endpoint).is_none() {
                return Err(graph_error(
                    ErrorCode::E302,
                    format!(
                        "link from `{}` to `{}` refers to unknown node `{endpoint}`",
                        link.from(),
                        link.to()
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn sentinel_links(index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    if let Some(link) = index.incoming(START_ID).first() {
        return Err(graph_error(
            ErrorCode::E304,
            format!("START cannot have incoming links, found one from `{}`", link.from()),
        ));
    }
    if let Some(link) = index.outgoing(END_ID).first() {
        return Err(graph_error(
            ErrorCode::E304,
            format!("END cannot have outgoing links, found one to `{}`", link.to()),
        ));
    }
    if index.outgoing(START_ID).is_empty() {
        return Err(graph_error(ErrorCode::E304, "START has no outgoing link"));
    }
    if index.incoming(END_ID).is_empty() {
        return Err(graph_error(ErrorCode::E304, "END has no incoming link"));
    }
    Ok(())
}

fn no_conflicting_links(graph: &Graph) -> Result<(), Diagnostic> {
    let mut links: HashSet<&Link> = HashSet::new();
    let mut statuses: HashSet<(&str, &str)> = HashSet::new();

    for link in graph.links() {
        if !links.insert(link) {
            return Err(graph_error(
                ErrorCode::E303,
                format!(
                    "link from `{}` to `{}` on `{}` is repeated",
                    link.from(),
                    link.to(),
                    link.exit_status()
                ),
            ));
        }
        if !link.is_default() && !statuses.insert((link.from(), link.exit_status())) {
            return Err(graph_error(
                ErrorCode::E303,
                format!(
                    "node `{}` has more than one link for exit status `{}`",
                    link.from(),
                    link.exit_status()
                ),
            ));
        }
    }
    Ok(())
}

fn transition_endpoints(graph: &Graph, index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    for link in graph.links().iter().filter(|link| !link.is_default()) {
        let from = index.node(link.from());
        let to = index.node(link.to());

        if from.is_some_and(Node::is_start) {
            return Err(graph_error(
                ErrorCode::E307,
                format!("START cannot have a transition, found `{}`", link.exit_status()),
            ));
        }
        if from.is_some_and(Node::is_sync) && index.in_degree(link.from()) < 2 {
            return Err(graph_error(
                ErrorCode::E307,
                format!(
                    "{SYNC_NAME} node `{}` does not join branches and cannot have transitions",
                    link.from()
                ),
            ));
        }
        if to.is_some_and(Node::is_sync) {
            return Err(graph_error(
                ErrorCode::E307,
                format!(
                    "transition `{}` from `{}` targets {SYNC_NAME} node `{}`",
                    link.exit_status(),
                    link.from(),
                    link.to()
                ),
            ));
        }
    }
    Ok(())
}

/// A `SYNC` that joins nothing is dropped from the text, so it cannot keep
/// a label.
fn pass_through_syncs(graph: &Graph, index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    let labelled = graph
        .nodes()
        .iter()
        .filter(|node| node.is_sync() && index.in_degree(node.id()) < 2)
        .find_map(|node| Some((node.id(), node.label()?)));

    match labelled {
        Some((id, label)) => Err(graph_error(
            ErrorCode::E308,
            format!("{SYNC_NAME} node `{id}` does not join branches and cannot have label `{label}`"),
        )),
        None => Ok(()),
    }
}

fn expressible(graph: &Graph) -> Result<(), Diagnostic> {
    let mut labels: HashMap<&str, &str> = HashMap::new();

    for node in graph.nodes() {
        if node.is_task() {
            if !is_identifier(node.name()) {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!("node `{}` has invalid app name `{}`", node.id(), node.name()),
                ));
            }
            if node.name() == START_ID || node.name() == END_ID {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!("node `{}` uses reserved name `{}`", node.id(), node.name()),
                ));
            }
        }

        if let Some(label) = node.label() {
            if !is_identifier(label) || label == START_ID || label == END_ID {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!("node `{}` has invalid label `{label}`", node.id()),
                ));
            }
            if let Some(other) = labels.insert(label, node.id()) {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!(
                        "label `{label}` is used by nodes `{other}` and `{}`",
                        node.id()
                    ),
                ));
            }
        }

        for (key, value) in node.properties() {
            if !is_identifier(key) {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!("node `{}` has invalid property name `{key}`", node.id()),
                ));
            }
            if value.contains('\n') {
                return Err(graph_error(
                    ErrorCode::E308,
                    format!("property `{key}` of node `{}` spans several lines", node.id()),
                ));
            }
        }
    }

    match graph
        .links()
        .iter()
        .find(|link| link.exit_status().contains('\n'))
    {
        Some(link) => Err(graph_error(
            ErrorCode::E308,
            format!("exit status of a link from `{}` spans several lines", link.from()),
        )),
        None => Ok(()),
    }
}

/// The default flow must be acyclic, reach every node from START, and give
/// every node but END a way forward.
fn default_flow(graph: &Graph, index: &GraphIndex<'_>) -> Result<(), Diagnostic> {
    let mut flow: DiGraph<&str, ()> = DiGraph::new();
    let indices: HashMap<&str, NodeIndex> = graph
        .nodes()
        .iter()
        .map(|node| (node.id(), flow.add_node(node.id())))
        .collect();

    for link in graph.links().iter().filter(|link| link.is_default()) {
        if let (Some(&from), Some(&to)) = (indices.get(link.from()), indices.get(link.to())) {
            flow.add_edge(from, to, ());
        }
    }

    if let Err(cycle) = toposort(&flow, None) {
        return Err(graph_error(
            ErrorCode::E305,
            format!("default flow has a cycle through node `{}`", flow[cycle.node_id()]),
        ));
    }

    let mut reachable = HashSet::new();
    if let Some(&start) = indices.get(START_ID) {
        let mut dfs = Dfs::new(&flow, start);
        while let Some(index) = dfs.next(&flow) {
            reachable.insert(flow[index]);
        }
    }

    for node in graph.nodes() {
        if !reachable.contains(node.id()) {
            return Err(graph_error(
                ErrorCode::E305,
                format!("node `{}` cannot be reached from START by default links", node.id()),
            ));
        }
        if !node.is_end() && index.successors(node.id()).is_empty() {
            return Err(graph_error(
                ErrorCode::E305,
                format!("node `{}` has no default link", node.id()),
            ));
        }
    }
    Ok(())
}
