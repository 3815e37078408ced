mod directed_graph;
mod error;

pub mod import;

pub use directed_graph::DirectedGraph;
pub use error::GraphError;

/// Index of a node, always in `[0, node_count)`.
pub type Node = usize;

/// Directed edge in the form (from_id, to_id).
pub type Edge = (Node, Node);

/// Integer edge weight as read from a problem file.
pub type Weight = i64;
