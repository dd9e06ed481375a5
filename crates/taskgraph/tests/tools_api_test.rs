//! Integration tests for the TaskTools API
//!
//! These tests drive both conversions through the public entry points and
//! check the shapes a client sees.

use taskgraph::{Graph, Link, Node, TaskTextRequest, TaskTools};

fn to_graph(dsl: &str) -> taskgraph::TaskGraphResponse {
    TaskTools::default().parse_task_text_to_graph(&TaskTextRequest::new("test", dsl))
}

fn node_names(graph: &Graph) -> Vec<(&str, &str)> {
    graph.nodes().iter().map(|n| (n.id(), n.name())).collect()
}

fn links(graph: &Graph) -> Vec<(&str, &str, &str)> {
    graph
        .links()
        .iter()
        .map(|l| (l.from(), l.to(), l.exit_status()))
        .collect()
}

#[test]
fn test_sequence_to_graph() {
    let response = to_graph("foo && bar");
    assert!(response.errors.is_empty());

    let graph = response.graph.expect("Failed to build graph");
    assert_eq!(
        node_names(&graph),
        vec![("START", "START"), ("0", "foo"), ("1", "bar"), ("END", "END")]
    );
    assert_eq!(
        links(&graph),
        vec![("START", "0", "*"), ("0", "1", "*"), ("1", "END", "*")]
    );
}

#[test]
fn test_undefined_target_fails_closed() {
    let response = to_graph("foo 'fail' -> kill1 && bar");

    assert!(response.graph.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].range(), Some((14, 19)));
}

#[test]
fn test_split_to_graph() {
    let graph = to_graph("<foo || bar> && baz")
        .graph
        .expect("Failed to build graph");

    assert_eq!(
        node_names(&graph),
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
        links(&graph),
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
fn test_graph_without_start() {
    let graph = Graph::new(
        vec![Node::new("0", "foo"), Node::end()],
        vec![Link::new("0", "END")],
    );

    let response = TaskTools::default().convert_task_graph_to_text(&graph);
    assert!(response.dsl.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message(), "graph has no START node");
}

#[test]
fn test_second_round_trip_is_unchanged() {
    let tools = TaskTools::default();
    let source = "prepare --env=prod\n<a: load --path='/x y' 'FAILED' -> c || b: load>\nc: cleanup";

    let first = tools
        .dsl_text(&tools.graph("t", source).expect("Failed to build graph"))
        .expect("Failed to render graph");
    let second = tools
        .dsl_text(&tools.graph("t", &first).expect("Failed to rebuild graph"))
        .expect("Failed to render rebuilt graph");

    assert_eq!(
        first,
        "prepare --env=prod && <a: load --path='/x y' 'FAILED' -> c || b: load> && c: cleanup"
    );
    assert_eq!(second, first);
}

#[test]
fn test_all_validation_problems_are_reported() {
    let response = to_graph("a: foo && a: bar && a: baz 'X' -> missing");

    assert!(response.graph.is_none());
    assert_eq!(response.errors.len(), 3);
    assert!(response.errors.iter().all(|e| e.range().is_some()));
}

#[test]
fn test_syntax_error_has_one_descriptor() {
    let response = to_graph("foo && && bar");

    assert!(response.graph.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].range(), Some((7, 9)));
}

#[test]
fn test_graph_from_json() {
    let json = r#"{
        "nodes": [
            {"id": "START", "name": "START"},
            {"id": "a", "name": "timestamp", "properties": {"format": "yyyy MM"}},
            {"id": "END", "name": "END"}
        ],
        "links": [
            {"from": "START", "to": "a"},
            {"from": "a", "to": "END", "exitStatus": "*"}
        ]
    }"#;
    let graph: Graph = serde_json::from_str(json).expect("Failed to deserialize graph");

    let response = TaskTools::default().convert_task_graph_to_text(&graph);
    assert_eq!(response.dsl.as_deref(), Some("timestamp --format='yyyy MM'"));
}

#[test]
fn test_long_definition_round_trip() {
    let tools = TaskTools::default();
    let source = vec!["step --n=1"; 10_000].join("\n");

    let graph = tools.graph("long", &source).expect("Failed to build graph");
    assert_eq!(graph.nodes().len(), 10_002);

    let text = tools.dsl_text(&graph).expect("Failed to render graph");
    assert_eq!(text, vec!["step --n=1"; 10_000].join(" && "));
}

#[test]
fn test_labelled_pass_through_sync_is_reported() {
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

    let response = TaskTools::default().convert_task_graph_to_text(&graph);
    assert!(response.dsl.is_none());
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message().contains("`keep`"));
}
