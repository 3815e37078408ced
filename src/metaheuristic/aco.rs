mod ant;
mod colony;
mod params;
pub mod pheromone;
pub mod strategy;
pub mod supervisor;

pub use ant::{Ant, VISITED};
pub use colony::Colony;
pub use params::{Params, ParamsError};
pub use strategy::{Pool, Scheduler, ScheduleError, Serial, Spawn, StrategyConfig, StrategyError};
pub use supervisor::{Profile, Report};

use oorandom::Rand64;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::graph::import::Problem;
use crate::graph::{DirectedGraph, Edge, GraphError, Node, Weight};
use crate::metaheuristic::aco::pheromone::{minmax, PheromoneTable};
use crate::metaheuristic::solution::UNREACHABLE;
use crate::metaheuristic::Route;
use crate::rng::{next_seed, preseeded_rng64, rng64};

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
    #[error("the graph has no nodes")]
    EmptyGraph,
    #[error("traversal graph has {graph} nodes but dependency graph has {dependencies}")]
    NodeCountMismatch { graph: usize, dependencies: usize },
    #[error("at least one ant is required")]
    NoAnts,
    #[error("ant start node {0} is not in the graph")]
    InvalidStart(Node),
    #[error("visibility of edge {0:?} is not a finite number")]
    NonFiniteVisibility(Edge),
    #[error("pheromone and visibility values are too large to select edges from")]
    NonFiniteSelection,
}

/// Ant colony optimizer for the sequential ordering problem.
///
/// Every round walks a fresh copy of the initial ants using the scheduler `S`, then lets
/// the best ant of the round deposit pheromones. Only the pheromone table, the best route
/// and the round counter survive a round.
pub struct Optimizer<S: Scheduler> {
    colony: Arc<Colony>,
    pheromones: Arc<PheromoneTable>,
    initial_ants: Vec<Ant>,
    best_route: Route,
    round: usize,
    rng: Rand64,
    scheduler: S,
}

impl<S: Scheduler> Optimizer<S> {
    /// Builds an optimizer with one ant per entry of `starts`.
    /// Without a seed the ants draw from an os seeded generator.
    pub fn new(
        traffic: DirectedGraph,
        dependencies: DirectedGraph,
        weights: BTreeMap<Edge, Weight>,
        starts: impl IntoIterator<Item = Node>,
        params: Params,
        seed: Option<u128>,
        scheduler: S,
    ) -> Result<Self, OptimizerError> {
        let colony = Colony::new(traffic, dependencies, weights, params)?;
        let initial_ants = starts
            .into_iter()
            .map(|start| colony.prepare_ant(start))
            .collect::<Result<Vec<_>, _>>()?;
        if initial_ants.is_empty() {
            return Err(OptimizerError::NoAnts);
        }

        Ok(Optimizer {
            pheromones: Arc::new(colony.initial_pheromones()),
            colony: Arc::new(colony),
            initial_ants,
            best_route: Route::unreachable(),
            round: 0,
            rng: seed.map(rng64).unwrap_or_else(preseeded_rng64),
            scheduler,
        })
    }

    /// Builds an optimizer for a parsed instance with `ant_count` ants starting on node 0.
    pub fn from_problem(
        problem: &Problem,
        ant_count: usize,
        params: Params,
        seed: Option<u128>,
        scheduler: S,
    ) -> Result<Self, OptimizerError> {
        Optimizer::new(
            problem.graph.clone(),
            problem.dependencies.clone(),
            problem.weights.clone(),
            vec![0; ant_count],
            params,
            seed,
            scheduler,
        )
    }

    /// Runs exactly one round.
    pub fn optimize(&mut self) -> Result<(), ScheduleError> {
        let ants = self.spawn_ants();
        let ants = match self
            .scheduler
            .walk(&self.colony, &self.pheromones, ants)
        {
            Ok(ants) => ants,
            Err(err) => {
                if let Err(shutdown_err) = self.scheduler.shutdown() {
                    warn!(error = %shutdown_err, "failed to stop workers after a failed round");
                }
                return Err(err);
            }
        };

        self.finish_round(&ants);
        Ok(())
    }

    /// Runs `rounds` rounds, timing each of them, and stops the scheduler's workers afterwards.
    pub fn optimize_rounds(&mut self, rounds: usize) -> Result<Profile, ScheduleError> {
        let mut profile = Profile::default();
        for _ in 0..rounds {
            let start = Instant::now();
            self.optimize()?;
            profile.record(start.elapsed());
        }
        self.scheduler.shutdown()?;

        Ok(profile)
    }

    /// Stops any worker threads the scheduler keeps between rounds.
    pub fn shutdown(&mut self) -> Result<(), ScheduleError> {
        self.scheduler.shutdown()
    }

    /// Copies the initial ants and gives each one its own stream, in ant order.
    fn spawn_ants(&mut self) -> Vec<Ant> {
        let mut ants = self.initial_ants.clone();
        for ant in ants.iter_mut() {
            ant.reseed(next_seed(&mut self.rng));
        }

        ants
    }

    /// Scores a walked round and updates the pheromone table.
    pub(crate) fn finish_round(&mut self, ants: &[Ant]) {
        self.round += 1;

        let best = ants
            .iter()
            .filter(|ant| self.colony.goal_reached(ant))
            .filter_map(|ant| match ant.route().length() {
                Some(length) if length != UNREACHABLE => Some((length, ant.route())),
                _ => None,
            })
            .min_by_key(|(length, _)| *length);

        let (length, route) = match best {
            Some(best) => best,
            None => {
                warn!(round = self.round, "no ant reached the goal");
                return;
            }
        };

        let best_length = self.best_route.length().unwrap_or(UNREACHABLE);
        if length < best_length {
            info!(round = self.round, length, "found a shorter route");
            self.best_route = route.clone();
        }

        let pheromones = Arc::make_mut(&mut self.pheromones);
        self.colony.update_pheromones(pheromones, route, length);
        debug!(round = self.round, length, "finished round");
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn best_route(&self) -> &Route {
        &self.best_route
    }

    pub fn colony(&self) -> &Colony {
        &self.colony
    }

    pub fn ant_count(&self) -> usize {
        self.initial_ants.len()
    }

    /// Returns the pheromone level of an edge, or 0 for edges without one.
    pub fn pheromone(&self, edge: Edge) -> f64 {
        self.pheromones
            .get(edge)
            .map(|value| value.into_inner())
            .unwrap_or(0.0)
    }

    pub fn minmax_pheromone(&self) -> Option<(f64, f64)> {
        minmax(&self.pheromones)
    }

    pub fn pheromones(&self) -> impl Iterator<Item = (Edge, f64)> + '_ {
        self.pheromones
            .iter()
            .map(|(edge, value)| (edge, value.into_inner()))
    }

    pub fn strategy_name(&self) -> String {
        self.scheduler.name()
    }

    pub fn strategy_args(&self) -> String {
        self.scheduler.args()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn four_node_weights() -> BTreeMap<Edge, Weight> {
        vec![
            ((0, 1), 1),
            ((1, 2), 1),
            ((2, 3), 1),
            ((0, 2), 5),
            ((1, 3), 5),
            ((0, 3), 9),
        ]
        .into_iter()
        .collect()
    }

    fn four_node_optimizer(seed: u128) -> Optimizer<Serial> {
        let weights = four_node_weights();
        let graph = DirectedGraph::from_edges(4, weights.keys().copied()).unwrap();
        let params = Params::new(1.0, 0.0, 0.0, 10.0, 1.0, 0.01, 100.0, 0.1);

        Optimizer::new(
            graph,
            DirectedGraph::with_nodes(4),
            weights,
            vec![0],
            params,
            Some(seed),
            Serial,
        )
        .unwrap()
    }

    #[test]
    fn new_without_ants_errors() {
        let result = Optimizer::new(
            DirectedGraph::with_nodes(2),
            DirectedGraph::with_nodes(2),
            BTreeMap::new(),
            vec![],
            Params::default(),
            None,
            Serial,
        );

        assert!(matches!(result, Err(OptimizerError::NoAnts)));
    }

    #[test]
    fn new_with_invalid_start_errors() {
        let result = Optimizer::new(
            DirectedGraph::with_nodes(2),
            DirectedGraph::with_nodes(2),
            BTreeMap::new(),
            vec![0, 5],
            Params::default(),
            None,
            Serial,
        );

        assert!(matches!(result, Err(OptimizerError::InvalidStart(5))));
    }

    #[test]
    fn four_nodes_single_ant() {
        // forward edges only, so every successful walk is 0 -> 1 -> 2 -> 3
        let mut optimizer = four_node_optimizer(3);
        assert_eq!(optimizer.best_route().length(), Some(UNREACHABLE));

        while optimizer.best_route().is_empty() {
            optimizer.optimize().unwrap();
            assert!(optimizer.round() < 1000, "The ant never reached the goal.");
        }

        assert_eq!(optimizer.best_route().nodes(), &[0, 1, 2, 3]);
        assert_eq!(optimizer.best_route().length(), Some(3));
        for edge in [(0, 1), (1, 2), (2, 3)].iter() {
            assert!(approx_eq!(
                f64,
                optimizer.pheromone(*edge),
                1.0 + 10.0 / 3.0,
                ulps = 4
            ));
        }
        for edge in [(0, 2), (1, 3), (0, 3)].iter() {
            assert_eq!(optimizer.pheromone(*edge), 1.0, "No evaporation with roh = 0.");
        }
    }

    #[test]
    fn zero_length_route_saturates_pheromones() {
        let weights: BTreeMap<Edge, Weight> = vec![((0, 1), 0), ((1, 2), 0)].into_iter().collect();
        let graph = DirectedGraph::from_edges(3, weights.keys().copied()).unwrap();
        let params = Params::new(1.0, 2.0, 0.0, 1.0, 1.0, 0.01, 10.0, 0.1);
        let mut optimizer = Optimizer::new(
            graph,
            DirectedGraph::with_nodes(3),
            weights,
            vec![0],
            params,
            Some(4),
            Serial,
        )
        .unwrap();

        optimizer.optimize().unwrap();

        assert_eq!(optimizer.best_route().nodes(), &[0, 1, 2]);
        assert_eq!(optimizer.best_route().length(), Some(0));
        assert_eq!(optimizer.pheromone((0, 1)), 10.0);
        assert_eq!(optimizer.pheromone((1, 2)), 10.0);
    }

    #[test]
    fn failed_round_changes_nothing_but_the_round() {
        let mut optimizer = four_node_optimizer(3);
        let before: Vec<_> = optimizer.pheromones().collect();

        let mut ant = optimizer.colony().prepare_ant(0).unwrap();
        ant.get_stuck();
        optimizer.finish_round(&[ant]);

        assert_eq!(optimizer.round(), 1);
        assert_eq!(optimizer.pheromones().collect::<Vec<_>>(), before);
        assert!(optimizer.best_route().is_empty());
    }

    #[test]
    fn disconnected_route_never_becomes_best() {
        let mut weights = four_node_weights();
        weights.remove(&(1, 3));
        let mut graph = DirectedGraph::from_edges(4, weights.keys().copied()).unwrap();
        graph.add_edge((1, 3)).unwrap();
        graph.add_edge((2, 1)).unwrap();
        let mut optimizer = Optimizer::new(
            graph,
            DirectedGraph::with_nodes(4),
            weights,
            vec![0],
            Params::default(),
            Some(1),
            Serial,
        )
        .unwrap();
        let before: Vec<_> = optimizer.pheromones().collect();

        // a walk 0 -> 2 -> 1 -> 3 that uses the unweighted edge (1, 3)
        let mut ant = optimizer.colony().prepare_ant(0).unwrap();
        ant.visit(2, &DirectedGraph::with_nodes(4));
        ant.visit(1, &DirectedGraph::with_nodes(4));
        ant.visit(3, &DirectedGraph::with_nodes(4));
        let length = optimizer.colony().route_length(ant.route().nodes());
        ant.route_mut().set_length(length);
        assert_eq!(length, UNREACHABLE);

        optimizer.finish_round(&[ant]);

        assert!(optimizer.best_route().is_empty());
        assert_eq!(optimizer.pheromones().collect::<Vec<_>>(), before);
    }

    #[test]
    fn best_route_only_improves() {
        let weights: BTreeMap<Edge, Weight> = four_node_weights()
            .into_iter()
            .flat_map(|((from, to), weight)| vec![((from, to), weight), ((to, from), weight)])
            .collect();
        let graph = DirectedGraph::from_edges(4, weights.keys().copied()).unwrap();
        let mut optimizer = Optimizer::new(
            graph,
            DirectedGraph::with_nodes(4),
            weights,
            vec![0; 4],
            Params::default(),
            Some(11),
            Serial,
        )
        .unwrap();

        let mut last = UNREACHABLE;
        for _ in 0..30 {
            optimizer.optimize().unwrap();
            let length = optimizer.best_route().length().unwrap();
            assert!(length <= last);
            last = length;
        }
        assert_eq!(optimizer.round(), 30);
    }

    #[test]
    fn same_seed_same_result() {
        let mut first = four_node_optimizer(77);
        let mut second = four_node_optimizer(77);
        first.optimize_rounds(10).unwrap();
        second.optimize_rounds(10).unwrap();

        assert_eq!(first.best_route(), second.best_route());
        assert_eq!(
            first.pheromones().collect::<Vec<_>>(),
            second.pheromones().collect::<Vec<_>>()
        );
    }

    #[test]
    fn optimize_rounds_profiles_every_round() {
        let mut optimizer = four_node_optimizer(5);
        let profile = optimizer.optimize_rounds(7).unwrap();

        assert_eq!(profile.count(), 7);
        assert_eq!(optimizer.round(), 7);
        assert_eq!(optimizer.strategy_name(), "serial");
        assert_eq!(optimizer.minmax_pheromone().map(|(min, _)| min >= 0.01), Some(true));
    }
}
