use crate::graph::{Edge, Node, Weight};

/// Length of a route that uses an edge without a weight.
pub const UNREACHABLE: Weight = Weight::MAX;

/// An ordered sequence of nodes together with its total weight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    nodes: Vec<Node>,
    length: Option<Weight>,
}

impl Route {
    pub fn new() -> Self {
        Route::default()
    }

    /// An empty route that every connected route improves on.
    pub fn unreachable() -> Self {
        Route {
            nodes: Vec::new(),
            length: Some(UNREACHABLE),
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Route {
            nodes,
            length: None,
        }
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.length = None;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the total weight, or `None` if it was not computed since the last change.
    pub fn length(&self) -> Option<Weight> {
        self.length
    }

    pub fn set_length(&mut self, length: Weight) {
        self.length = Some(length);
    }

    /// Returns true if the length is known and every edge of the route has a weight.
    pub fn is_connected(&self) -> bool {
        matches!(self.length, Some(length) if length != UNREACHABLE)
    }

    /// Iterates the edges between consecutive nodes.
    pub fn iter_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }
}
