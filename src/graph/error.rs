use thiserror::Error;

use crate::graph::{Edge, Node};

#[derive(Debug, PartialEq, Error)]
pub enum GraphError {
    #[error("edge {0:?} is not in the graph")]
    MissingEdge(Edge),
    #[error("node {0} is not in the graph")]
    MissingNode(Node),
}
