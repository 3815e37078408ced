pub mod cli;
pub mod experiment;
pub mod experiment_config;
pub mod graph;
pub mod logging;
pub mod metaheuristic;
pub mod rng;
pub mod sync;
