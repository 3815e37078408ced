#![cfg(not(feature = "loom"))]

use std::collections::BTreeMap;

use sop_aco::graph::{DirectedGraph, Edge, Weight};
use sop_aco::metaheuristic::aco::{Params, Pool, Scheduler, Serial, Spawn, StrategyConfig};
use sop_aco::metaheuristic::{Optimizer, Route};

const NODES: usize = 8;
const ANTS: usize = 10;
const ROUNDS: usize = 20;
const SEED: u128 = 42;

fn weights() -> BTreeMap<Edge, Weight> {
    let mut weights = BTreeMap::new();
    for from in 0..NODES {
        for to in 0..NODES {
            if from != to {
                weights.insert((from, to), ((from * 7 + to * 3) % 10) as Weight + 1);
            }
        }
    }

    weights
}

fn optimizer<S: Scheduler>(scheduler: S) -> Optimizer<S> {
    let weights = weights();
    let graph = DirectedGraph::from_edges(NODES, weights.keys().copied()).unwrap();
    // 3 before 1, 5 before 2
    let dependencies = DirectedGraph::from_edges(NODES, vec![(3, 1), (5, 2)]).unwrap();

    Optimizer::new(
        graph,
        dependencies,
        weights,
        vec![0; ANTS],
        Params::default(),
        Some(SEED),
        scheduler,
    )
    .unwrap()
}

fn run<S: Scheduler>(scheduler: S) -> (Route, Vec<(Edge, f64)>) {
    let mut optimizer = optimizer(scheduler);
    let profile = optimizer.optimize_rounds(ROUNDS).unwrap();
    assert_eq!(profile.count(), ROUNDS);
    assert_eq!(optimizer.round(), ROUNDS);

    (
        optimizer.best_route().clone(),
        optimizer.pheromones().collect(),
    )
}

#[test]
fn all_strategies_agree_on_a_fixed_seed() {
    let (serial_route, serial_pheromones) = run(Serial);
    assert!(
        serial_route.is_connected(),
        "No ant reached the goal in {} rounds.",
        ROUNDS
    );

    for (name, args) in [
        ("parallel", ""),
        ("batched_3", ""),
        ("batched", "10"),
        ("threaded", "4"),
        ("threaded", "32"),
    ]
    .iter()
    {
        let scheduler = StrategyConfig::new(name, args).build().unwrap();
        let (route, pheromones) = run(scheduler);

        assert_eq!(route, serial_route, "Best route of {} differs.", name);
        let identical = pheromones
            .iter()
            .zip(serial_pheromones.iter())
            .all(|((a_edge, a), (b_edge, b))| a_edge == b_edge && a.to_bits() == b.to_bits());
        assert!(
            identical && pheromones.len() == serial_pheromones.len(),
            "Pheromones of {} {} differ.",
            name,
            args
        );
    }
}

#[test]
fn spawn_matches_serial_round_by_round() {
    let mut serial = optimizer(Serial);
    let mut spawn = optimizer(Spawn);

    for _ in 0..5 {
        serial.optimize().unwrap();
        spawn.optimize().unwrap();
        assert_eq!(serial.best_route(), spawn.best_route());
        assert_eq!(serial.minmax_pheromone(), spawn.minmax_pheromone());
    }
}

#[test]
fn pool_runs_exactly_the_requested_rounds_and_stops() {
    let mut optimizer = optimizer(Pool::batched(3).unwrap());
    assert!(!optimizer.scheduler().is_running());

    optimizer.optimize().unwrap();
    assert!(optimizer.scheduler().is_running());
    assert_eq!(optimizer.scheduler().worker_count(), 4);

    optimizer.optimize_rounds(7).unwrap();
    assert_eq!(optimizer.round(), 8);
    assert!(!optimizer.scheduler().is_running());
    assert_eq!(optimizer.scheduler().worker_count(), 0);

    // the pool starts again on demand
    optimizer.optimize().unwrap();
    assert_eq!(optimizer.round(), 9);
    assert!(optimizer.scheduler().is_running());
}

#[test]
fn threaded_pool_never_has_more_workers_than_ants() {
    let mut optimizer = optimizer(Pool::threaded(Some(64)).unwrap());
    optimizer.optimize().unwrap();

    assert_eq!(optimizer.scheduler().worker_count(), ANTS);
    assert_eq!(optimizer.strategy_name(), "threaded");
    assert_eq!(optimizer.strategy_args(), "64");
    optimizer.shutdown().unwrap();
    assert!(!optimizer.scheduler().is_running());
}

#[test]
fn dropping_a_running_pool_stops_it() {
    let mut optimizer = optimizer(Pool::threaded(Some(3)).unwrap());
    optimizer.optimize().unwrap();
    assert!(optimizer.scheduler().is_running());

    drop(optimizer);
}

#[test]
fn pheromones_stay_within_bounds() {
    let params = Params::default();
    let mut optimizer = optimizer(Pool::batched(4).unwrap());
    optimizer.optimize_rounds(ROUNDS).unwrap();

    for (edge, value) in optimizer.pheromones() {
        assert!(
            value >= params.min_pheromone && value <= params.max_pheromone,
            "Pheromone {} on {:?} is out of bounds.",
            value,
            edge
        );
    }
}
