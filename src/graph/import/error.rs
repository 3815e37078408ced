use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Missing file: {0}")]
    MissingFile(String),
    #[error("Invalid format on file: {0}")]
    InvalidFormat(String),
    #[error("Invalid graph in file: {0}")]
    InvalidGraph(#[from] GraphError),
}
