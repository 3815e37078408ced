use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::graph::import::ImportError;
use crate::graph::{DirectedGraph, Edge, Weight};

/// Matrix entry marking that the column node has to be visited before the row node.
const PRECEDENCE_ENTRY: Weight = -1;

/// Known lower and upper bound of the optimal route length of an instance.
#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct Bounds {
    pub lower: Weight,
    pub upper: Weight,
}

/// A sequential ordering problem instance.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub comment: String,
    /// Edges an ant may travel along.
    pub graph: DirectedGraph,
    /// An edge (a, b) means a has to be visited before b.
    pub dependencies: DirectedGraph,
    pub weights: BTreeMap<Edge, Weight>,
    pub bounds: Option<Bounds>,
}

impl Problem {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the largest edge weight, or 0 for an instance without edges.
    pub fn max_weight(&self) -> Weight {
        self.weights.values().copied().max().unwrap_or(0)
    }

    pub fn with_bounds(mut self, bounds: Option<Bounds>) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Reads a problem in TSPLIB SOP format from the given file.
pub fn read_sop(path: impl AsRef<Path>) -> Result<Problem, ImportError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|err| ImportError::MissingFile(format!("{} ({})", path.display(), err)))?;

    parse_sop(&content)
}

/// Parses a problem in TSPLIB SOP format.
///
/// Only `NAME` and `COMMENT` are read from the header. The `EDGE_WEIGHT_SECTION`
/// starts with the dimension n followed by n * n integers in row order; line
/// breaks inside the section carry no meaning.
pub fn parse_sop(content: &str) -> Result<Problem, ImportError> {
    let mut name = None;
    let mut comment = None;
    let mut in_section = false;
    let mut numbers = Vec::new();

    for line in content.lines().map(str::trim) {
        if in_section {
            if line == "EOF" {
                break;
            }
            for token in line.split_whitespace() {
                let value = token.parse::<Weight>().map_err(|_| {
                    ImportError::InvalidFormat(format!("'{}' is not an integer", token))
                })?;
                numbers.push(value);
            }
            continue;
        }

        if line == "EDGE_WEIGHT_SECTION" {
            in_section = true;
        } else if let Some(value) = header_value(line, "NAME") {
            name.get_or_insert(value);
        } else if let Some(value) = header_value(line, "COMMENT") {
            comment.get_or_insert(value);
        }
    }

    if !in_section {
        return Err(ImportError::InvalidFormat(
            "missing EDGE_WEIGHT_SECTION".to_string(),
        ));
    }

    let (&dimension, matrix) = numbers.split_first().ok_or_else(|| {
        ImportError::InvalidFormat("EDGE_WEIGHT_SECTION has no dimension".to_string())
    })?;
    if dimension < 1 {
        return Err(ImportError::InvalidFormat(format!(
            "dimension must be positive, got {}",
            dimension
        )));
    }
    let too_large = || ImportError::InvalidFormat(format!("dimension {} is too large", dimension));
    let dimension = usize::try_from(dimension).map_err(|_| too_large())?;
    let entries = dimension.checked_mul(dimension).ok_or_else(too_large)?;
    if matrix.len() != entries {
        return Err(ImportError::InvalidFormat(format!(
            "expected {} matrix entries for dimension {}, got {}",
            entries,
            dimension,
            matrix.len()
        )));
    }

    let mut graph = DirectedGraph::with_nodes(dimension);
    let mut dependencies = DirectedGraph::with_nodes(dimension);
    let mut weights = BTreeMap::new();
    for (index, &value) in matrix.iter().enumerate() {
        let (row, column) = (index / dimension, index % dimension);
        if row == column {
            continue;
        }

        match value {
            PRECEDENCE_ENTRY => dependencies.add_edge((column, row))?,
            weight if weight >= 0 => {
                graph.add_edge((row, column))?;
                weights.insert((row, column), weight);
            }
            invalid => {
                return Err(ImportError::InvalidFormat(format!(
                    "negative weight {} at ({}, {})",
                    invalid, row, column
                )))
            }
        }
    }

    Ok(Problem {
        name: name.unwrap_or_default(),
        comment: comment.unwrap_or_default(),
        graph,
        dependencies,
        weights,
        bounds: None,
    })
}

/// Returns the value of a `KEY: value` header line if the line belongs to `key`.
fn header_value(line: &str, key: &str) -> Option<String> {
    let rest = line.strip_prefix(key)?;
    if !(rest.is_empty() || rest.starts_with(':') || rest.starts_with(char::is_whitespace)) {
        return None;
    }

    Some(
        rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .to_string(),
    )
}
