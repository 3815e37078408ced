use decorum::R64;

use crate::graph::{Edge, GraphError};
use crate::metaheuristic::aco::Params;

/// Pheromone levels per traversal edge. Only the controller mutates it, between rounds.
pub type PheromoneTable = EdgeMatrix;
/// Precomputed `(1 / max(weight, zero_distance)) ^ beta` per weighted edge.
pub type VisibilityTable = EdgeMatrix;

/// Dense edge to value mapping backed by an adjacency matrix.
/// Edges without an entry hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMatrix {
    matrix: Vec<Vec<Option<R64>>>,
    size: usize,
}

impl EdgeMatrix {
    pub fn with_nodes(nodes: usize) -> Self {
        EdgeMatrix {
            matrix: (0..nodes).map(|_| vec![None; nodes]).collect(),
            size: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.matrix.len()
    }

    /// Returns the number of edges holding a value.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, (from, to): Edge) -> Option<R64> {
        self.matrix.get(from).and_then(|row| row.get(to)).copied().flatten()
    }

    /// Inserts or overwrites the value of an edge.
    pub fn set(&mut self, (from, to): Edge, value: R64) -> Result<(), GraphError> {
        let nodes = self.node_count();
        if from >= nodes {
            return Err(GraphError::MissingNode(from));
        } else if to >= nodes {
            return Err(GraphError::MissingNode(to));
        }

        if self.matrix[from][to].replace(value).is_none() {
            self.size += 1;
        }

        Ok(())
    }

    /// Iterates all edges holding a value in ascending (from, to) order.
    pub fn iter(&self) -> impl Iterator<Item = (Edge, R64)> + '_ {
        self.matrix.iter().enumerate().flat_map(|(from, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(to, value)| value.map(|value| ((from, to), value)))
        })
    }

    /// Replaces every stored value by the result of `f(edge, value)`.
    pub fn update_all(&mut self, mut f: impl FnMut(Edge, R64) -> R64) {
        for (from, row) in self.matrix.iter_mut().enumerate() {
            for (to, value) in row.iter_mut().enumerate() {
                if let Some(value) = value {
                    *value = f((from, to), *value);
                }
            }
        }
    }
}

/// Evaporates `value` and adds `delta`, clamped to the configured pheromone bounds.
pub fn update_edge(params: &Params, value: R64, delta: f64) -> R64 {
    let updated = value.into_inner() * (1.0 - params.roh) + delta;
    R64::from_inner(updated.clamp(params.min_pheromone, params.max_pheromone))
}

/// Returns the smallest and the largest value of the table, or `None` if it is empty.
pub fn minmax(table: &EdgeMatrix) -> Option<(f64, f64)> {
    table.iter().fold(None, |acc, (_, value)| {
        let value = value.into_inner();
        match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((f64::min(min, value), f64::max(max, value))),
        }
    })
}
