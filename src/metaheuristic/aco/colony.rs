use decorum::{Real, R64};
use num_traits::Zero;
use std::collections::BTreeMap;

use crate::graph::{DirectedGraph, Edge, Node, Weight};
use crate::metaheuristic::aco::pheromone::{update_edge, EdgeMatrix, PheromoneTable, VisibilityTable};
use crate::metaheuristic::aco::ant::unlock_counts;
use crate::metaheuristic::aco::{Ant, OptimizerError, Params};
use crate::metaheuristic::solution::{Route, UNREACHABLE};

/// The immutable part of an optimization run: the instance and the tables derived from it.
/// Shared read-only by all ants of a round.
#[derive(Debug)]
pub struct Colony {
    graph: DirectedGraph,
    dependencies: DirectedGraph,
    /// Number of predecessors per node, the `allowed` counters every ant starts with.
    unlock_counts: Vec<i32>,
    weights: BTreeMap<Edge, Weight>,
    visibility: VisibilityTable,
    params: Params,
    alpha: R64,
}

impl Colony {
    pub fn new(
        graph: DirectedGraph,
        dependencies: DirectedGraph,
        weights: BTreeMap<Edge, Weight>,
        params: Params,
    ) -> Result<Self, OptimizerError> {
        params.validate()?;
        if graph.is_empty() {
            return Err(OptimizerError::EmptyGraph);
        }
        if graph.node_count() != dependencies.node_count() {
            return Err(OptimizerError::NodeCountMismatch {
                graph: graph.node_count(),
                dependencies: dependencies.node_count(),
            });
        }

        let mut visibility = EdgeMatrix::with_nodes(graph.node_count());
        for (&edge, &weight) in weights.iter() {
            let value = (1.0 / f64::max(weight as f64, params.zero_distance)).powf(params.beta);
            if !value.is_finite() {
                return Err(OptimizerError::NonFiniteVisibility(edge));
            }
            visibility.set(edge, R64::from_inner(value))?;
        }

        // the roulette sum of a single step must stay finite
        let max_visibility = visibility
            .iter()
            .map(|(_, value)| value.into_inner())
            .fold(0.0, f64::max);
        let max_sum = params.max_pheromone.max(params.initial_pheromone).powf(params.alpha)
            * max_visibility
            * graph.node_count() as f64;
        if !max_sum.is_finite() {
            return Err(OptimizerError::NonFiniteSelection);
        }

        Ok(Colony {
            graph,
            unlock_counts: unlock_counts(&dependencies),
            dependencies,
            weights,
            visibility,
            alpha: R64::from_inner(params.alpha),
            params,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The terminal node every valid route ends on.
    pub fn goal(&self) -> Node {
        self.node_count() - 1
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn graph(&self) -> &DirectedGraph {
        &self.graph
    }

    pub fn dependencies(&self) -> &DirectedGraph {
        &self.dependencies
    }

    pub fn weights(&self) -> &BTreeMap<Edge, Weight> {
        &self.weights
    }

    pub fn visibility(&self) -> &VisibilityTable {
        &self.visibility
    }

    /// Places an ant on `start` with its unlock counters taken from the dependency graph.
    pub fn prepare_ant(&self, start: Node) -> Result<Ant, OptimizerError> {
        if !self.graph.has_node(start) {
            return Err(OptimizerError::InvalidStart(start));
        }

        Ok(Ant::new(
            start,
            self.unlock_counts.clone(),
            &self.dependencies,
        ))
    }

    /// Builds the table every run starts with: one entry per traversal edge.
    pub fn initial_pheromones(&self) -> PheromoneTable {
        let initial = R64::from_inner(self.params.initial_pheromone);
        let mut table = EdgeMatrix::with_nodes(self.node_count());
        for edge in self.graph.iter_edges() {
            // every edge of the graph references valid nodes
            let _res = table.set(edge, initial);
        }

        table
    }

    /// Unnormalized probability of `ant` moving to `node`.
    pub fn edge_value(&self, pheromones: &PheromoneTable, ant: &Ant, node: Node) -> R64 {
        let current = match ant.current() {
            Some(current) if ant.is_visitable(node) => current,
            _ => return R64::zero(),
        };

        match (
            pheromones.get((current, node)),
            self.visibility.get((current, node)),
        ) {
            (Some(pheromone), Some(visibility)) => R64::powf(pheromone, self.alpha) * visibility,
            _ => R64::zero(),
        }
    }

    /// Moves the ant along one edge chosen by roulette wheel selection.
    /// The ant gets stuck if none of its successors is visitable.
    pub fn advance_ant(&self, pheromones: &PheromoneTable, ant: &mut Ant) {
        let current = match ant.current() {
            Some(current) => current,
            None => return,
        };

        let mut sum = R64::zero();
        let candidates: Vec<(Node, R64)> = self
            .graph
            .successors(current)
            .map(|node| {
                sum += self.edge_value(pheromones, ant, node);
                (node, sum)
            })
            .collect();

        let rand = R64::from_inner(ant.draw()) * sum;
        let next = candidates
            .iter()
            .find(|(_, prefix)| *prefix > rand)
            .map(|(node, _)| *node);

        match next {
            Some(node) => ant.visit(node, &self.dependencies),
            None => ant.get_stuck(),
        }
    }

    /// Walks the ant until it visited every node or got stuck and scores it if it
    /// reached the goal.
    pub fn walk(&self, pheromones: &PheromoneTable, ant: &mut Ant) {
        for _ in 1..self.node_count() {
            if ant.is_stuck() {
                break;
            }
            self.advance_ant(pheromones, ant);
        }

        if self.goal_reached(ant) {
            let length = self.route_length(ant.route().nodes());
            ant.route_mut().set_length(length);
        }
    }

    pub fn walk_all(&self, pheromones: &PheromoneTable, ants: &mut [Ant]) {
        for ant in ants.iter_mut() {
            self.walk(pheromones, ant);
        }
    }

    /// Sums the weights of consecutive nodes.
    /// Returns `UNREACHABLE` as soon as a pair has no weight.
    pub fn route_length(&self, nodes: &[Node]) -> Weight {
        let mut length: Weight = 0;
        for pair in nodes.windows(2) {
            match self.weights.get(&(pair[0], pair[1])) {
                Some(&weight) => length = length.saturating_add(weight),
                None => return UNREACHABLE,
            }
        }

        length
    }

    pub fn goal_reached(&self, ant: &Ant) -> bool {
        ant.current() == Some(self.goal())
    }

    /// Evaporates every entry and deposits `q / length` along the given route.
    /// A zero length route saturates its edges at the upper pheromone bound.
    pub fn update_pheromones(&self, pheromones: &mut PheromoneTable, best: &Route, length: Weight) {
        let deposit = if self.params.q == 0.0 {
            0.0
        } else {
            let deposit = self.params.q / length as f64;
            if deposit.is_finite() {
                deposit
            } else {
                self.params.max_pheromone
            }
        };
        let mut deltas: BTreeMap<Edge, f64> = BTreeMap::new();
        for edge in best.iter_edges() {
            *deltas.entry(edge).or_insert(0.0) += deposit;
        }

        pheromones.update_all(|edge, value| {
            update_edge(
                &self.params,
                value,
                deltas.get(&edge).copied().unwrap_or(0.0),
            )
        });
    }
}
