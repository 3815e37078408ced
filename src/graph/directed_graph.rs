use std::collections::BTreeSet;

use crate::graph::{Edge, GraphError, Node};

/// Implements an unweighted, directed graph using adjacency sets as datastructure.
/// Nodes are always numbered consecutively starting at 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectedGraph {
    edges: BTreeSet<Edge>,
    adjacency: Vec<BTreeSet<Node>>,
}

impl DirectedGraph {
    /// Constructs a graph with nodes `0..nodes` and no edges.
    pub fn with_nodes(nodes: usize) -> Self {
        DirectedGraph {
            edges: BTreeSet::new(),
            adjacency: vec![BTreeSet::new(); nodes],
        }
    }

    /// Constructs a graph with nodes `0..nodes` and the given edges.
    /// Returns an error if any edge references a node outside of that range.
    pub fn from_edges(
        nodes: usize,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut graph = DirectedGraph::with_nodes(nodes);
        for edge in edges {
            graph.add_edge(edge)?;
        }

        Ok(graph)
    }

    /// Returns true if there are no nodes, or false otherwise.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns the number of nodes in this graph.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of edges in this graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_node(&self, id: Node) -> bool {
        id < self.adjacency.len()
    }

    /// Appends a new node and returns its id.
    pub fn add_node(&mut self) -> Node {
        self.adjacency.push(BTreeSet::new());
        self.adjacency.len() - 1
    }

    /// Removes a node and every edge from or to it.
    /// All nodes with a higher id move down by one, so ids stay consecutive.
    pub fn remove_node(&mut self, id: Node) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::MissingNode(id));
        }

        let shift = |node: Node| if node > id { node - 1 } else { node };
        self.edges = self
            .edges
            .iter()
            .filter(|(from, to)| *from != id && *to != id)
            .map(|&(from, to)| (shift(from), shift(to)))
            .collect();

        self.adjacency.remove(id);
        for successors in self.adjacency.iter_mut() {
            *successors = successors
                .iter()
                .filter(|&&node| node != id)
                .map(|&node| shift(node))
                .collect();
        }

        Ok(())
    }

    pub fn has_edge(&self, edge: Edge) -> bool {
        self.edges.contains(&edge)
    }

    /// Adds a new edge to the graph.
    /// Adding an edge that already exists does nothing.
    /// Returns an error if one of the nodes is missing.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let (from, to) = edge;
        if !self.has_node(from) {
            return Err(GraphError::MissingNode(from));
        } else if !self.has_node(to) {
            return Err(GraphError::MissingNode(to));
        }

        if self.edges.insert(edge) {
            self.adjacency[from].insert(to);
        }

        Ok(())
    }

    pub fn remove_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.edges.remove(&edge) {
            return Err(GraphError::MissingEdge(edge));
        }
        self.adjacency[edge.0].remove(&edge.1);

        Ok(())
    }

    /// Iterates the nodes reachable from `id` by a single edge in ascending order.
    /// Yields nothing for a node that is not in the graph.
    pub fn successors(&self, id: Node) -> impl Iterator<Item = Node> + '_ {
        self.adjacency.get(id).into_iter().flatten().copied()
    }

    /// Returns the count of outgoing edges of the node with given id.
    pub fn degree(&self, id: Node) -> Result<usize, GraphError> {
        self.adjacency
            .get(id)
            .map(|successors| successors.len())
            .ok_or(GraphError::MissingNode(id))
    }

    /// Iterates all edges in ascending (from, to) order.
    pub fn iter_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    /// Returns a graph over the same nodes with every edge reversed.
    pub fn inverted(&self) -> DirectedGraph {
        let mut inverted = DirectedGraph::with_nodes(self.node_count());
        for &(from, to) in self.edges.iter() {
            inverted.edges.insert((to, from));
            inverted.adjacency[to].insert(from);
        }

        inverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DirectedGraph {
        DirectedGraph::from_edges(4, vec![(0, 1), (0, 2), (1, 3), (2, 3)]).unwrap()
    }

    #[test]
    fn with_nodes_works() {
        let graph = DirectedGraph::with_nodes(3);

        assert_eq!(graph.node_count(), 3, "Graph should have three nodes.");
        assert_eq!(graph.edge_count(), 0, "Graph should have no edges.");
        assert!(!graph.is_empty());
        assert!(DirectedGraph::default().is_empty());
    }

    #[test]
    fn from_edges_with_missing_node_errors() {
        let err = DirectedGraph::from_edges(2, vec![(0, 1), (1, 2)]).err();

        assert_eq!(
            err,
            Some(GraphError::MissingNode(2)),
            "Not missing the node it should be missing."
        );
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut graph = diamond();
        graph.add_edge((0, 1)).unwrap();

        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.degree(0), Ok(2));
    }

    #[test]
    fn successors_are_ascending() {
        let mut graph = DirectedGraph::with_nodes(4);
        graph.add_edge((0, 3)).unwrap();
        graph.add_edge((0, 1)).unwrap();
        graph.add_edge((0, 2)).unwrap();

        assert_eq!(graph.successors(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(graph.successors(3).count(), 0);
        assert_eq!(graph.successors(17).count(), 0, "Unknown nodes have no successors.");
    }

    #[test]
    fn remove_edge_works() {
        let mut graph = diamond();
        graph.remove_edge((0, 1)).unwrap();

        assert!(!graph.has_edge((0, 1)));
        assert_eq!(graph.successors(0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(
            graph.remove_edge((0, 1)),
            Err(GraphError::MissingEdge((0, 1)))
        );
    }

    #[test]
    fn remove_node_renumbers_edges() {
        let mut graph = diamond();
        graph.remove_node(1).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.iter_edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        assert_eq!(graph.successors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.successors(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(graph.remove_node(3), Err(GraphError::MissingNode(3)));
    }

    #[test]
    fn add_node_appends() {
        let mut graph = diamond();
        let id = graph.add_node();

        assert_eq!(id, 4);
        assert!(graph.has_node(4));
        assert_eq!(graph.degree(4), Ok(0));
    }

    #[test]
    fn inverted_reverses_every_edge() {
        let inverted = diamond().inverted();

        assert_eq!(inverted.node_count(), 4);
        assert_eq!(
            inverted.iter_edges().collect::<Vec<_>>(),
            vec![(1, 0), (2, 0), (3, 1), (3, 2)]
        );
        assert_eq!(inverted.degree(3), Ok(2), "Node 3 has two predecessors.");
        assert_eq!(inverted.inverted(), diamond());
    }
}
