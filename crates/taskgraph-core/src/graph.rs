//! Graph representation of a composed task.
//!
//! A [`Graph`] is an ordered list of [`Node`]s and a list of [`Link`]s
//! between them. It is the shape exchanged with graphical editors and it is
//! serialized as:
//!
//! ```json
//! {
//!   "nodes": [{"id": "START", "name": "START"}, {"id": "0", "name": "foo"}, {"id": "END", "name": "END"}],
//!   "links": [{"from": "START", "to": "0", "exitStatus": "*"}, {"from": "0", "to": "END", "exitStatus": "*"}]
//! }
//! ```
//!
//! # Reserved nodes
//!
//! - [`START_ID`] and [`END_ID`] are the entry and terminal sentinels.
//! - Nodes named [`SYNC_NAME`] are join points closing a split.
//!
//! # Links
//!
//! A link with the [`WILDCARD`] exit status belongs to the default flow.
//! Several wildcard links leaving one node form a split fan-out. Any other
//! exit status is a transition; a consumer evaluates a node's links in
//! declaration order and takes the first match.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Id (and name) of the entry sentinel node.
pub const START_ID: &str = "START";

/// Id (and name) of the terminal sentinel node.
pub const END_ID: &str = "END";

/// Name of the join nodes that close a split.
pub const SYNC_NAME: &str = "SYNC";

/// Exit status matching any status not claimed by a more specific link.
pub const WILDCARD: &str = "*";

/// A composed task as nodes and exit-status labelled links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    links: Vec<Link>,
}

impl Graph {
    /// Create a graph from its nodes and links.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    /// All nodes, in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, in declaration order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Links leaving the node `id`, in declaration order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.from == id)
    }

    /// Links entering the node `id`, in declaration order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.to == id)
    }
}

/// A graph node.
///
/// Task app nodes carry the app name, an optional label and the app
/// arguments as ordered properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, String>,
}

impl Node {
    /// Create a node with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: None,
            properties: IndexMap::new(),
        }
    }

    /// The entry sentinel.
    pub fn start() -> Self {
        Self::new(START_ID, START_ID)
    }

    /// The terminal sentinel.
    pub fn end() -> Self {
        Self::new(END_ID, END_ID)
    }

    /// A split join point.
    pub fn sync(id: impl Into<String>) -> Self {
        Self::new(id, SYNC_NAME)
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append a property, keeping declaration order.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    /// Returns `true` for the `START` sentinel.
    pub fn is_start(&self) -> bool {
        self.id == START_ID
    }

    /// Returns `true` for the `END` sentinel.
    pub fn is_end(&self) -> bool {
        self.id == END_ID
    }

    /// Returns `true` for a split join point.
    pub fn is_sync(&self) -> bool {
        self.name == SYNC_NAME && !self.is_start() && !self.is_end()
    }

    /// Returns `true` for a node that stands for a task app.
    pub fn is_task(&self) -> bool {
        !self.is_start() && !self.is_end() && !self.is_sync()
    }
}

/// A directed link followed when `from` completes with `exit_status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    from: String,
    to: String,
    #[serde(default = "default_exit_status")]
    exit_status: String,
}

fn default_exit_status() -> String {
    WILDCARD.to_string()
}

impl Link {
    /// Create a default-flow link.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            exit_status: default_exit_status(),
        }
    }

    /// Set the exit status this link is followed on.
    pub fn with_exit_status(mut self, exit_status: impl Into<String>) -> Self {
        self.exit_status = exit_status.into();
        self
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn exit_status(&self) -> &str {
        &self.exit_status
    }

    /// Returns `true` if this link belongs to the default flow.
    pub fn is_default(&self) -> bool {
        self.exit_status == WILDCARD
    }
}
