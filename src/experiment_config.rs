use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::import::{Bounds, Problem};
use crate::metaheuristic::aco::{Params, StrategyConfig};
use crate::rng::os_random_seed;

#[derive(Debug, Error)]
pub enum ExperimentConfigError {
    #[error("Missing file: {0}")]
    MissingFile(String),
    #[error("Unsupported config format: {0}")]
    UnknownFormat(String),
    #[error("Invalid yaml config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid ron config: {0}")]
    Ron(String),
}

pub trait Fix<CorrectType> {
    fn to_fixed(&self) -> CorrectType;
}

/// A single run: which instance to solve, how and where to report it.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ExperimentConfig {
    /// Finished experiments are skipped by the runner.
    #[serde(default)]
    pub finished: bool,
    pub problem: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Known bounds of the optimal route length, copied into the report.
    #[serde(default)]
    pub bounds: Option<Bounds>,
    pub strategy: StrategyConfig,
    pub algorithm: AlgoConfig,
}

impl ExperimentConfig {
    /// Reads a config file, choosing the format by its extension (`yaml`, `yml` or `ron`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExperimentConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            ExperimentConfigError::MissingFile(format!("{} ({})", path.display(), err))
        })?;

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("yaml") | Some("yml") => ExperimentConfig::from_yaml(&content),
            Some("ron") => ExperimentConfig::from_ron(&content),
            _ => Err(ExperimentConfigError::UnknownFormat(
                path.display().to_string(),
            )),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ExperimentConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_ron(content: &str) -> Result<Self, ExperimentConfigError> {
        ron::de::from_str(content).map_err(|err| ExperimentConfigError::Ron(err.to_string()))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum AlgoConfig {
    Aco(AcoExperiment),
    UnseededAco(UnseededAcoExperiment),
}

impl AlgoConfig {
    /// Returns the experiment with a fixed seed, drawing one if the config has none.
    pub fn aco(&self) -> AcoExperiment {
        match self {
            AlgoConfig::Aco(aco) => *aco,
            AlgoConfig::UnseededAco(usaco) => usaco.to_fixed(),
        }
    }
}

#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct AcoExperiment {
    pub seed: u64,
    pub ant_count: usize,
    pub rounds: usize,
    pub alpha: f64,
    pub beta: f64,
    pub roh: f64,
    /// Defaults to the largest edge weight of the instance.
    #[serde(default)]
    pub q: Option<f64>,
    #[serde(default = "default_initial_pheromone")]
    pub initial_pheromone: f64,
    #[serde(default = "default_min_pheromone")]
    pub min_pheromone: f64,
    #[serde(default = "default_max_pheromone")]
    pub max_pheromone: f64,
    #[serde(default = "default_zero_distance")]
    pub zero_distance: f64,
}

impl AcoExperiment {
    pub fn params(&self, problem: &Problem) -> Params {
        Params::new(
            self.alpha,
            self.beta,
            self.roh,
            self.q.unwrap_or(problem.max_weight() as f64),
            self.initial_pheromone,
            self.min_pheromone,
            self.max_pheromone,
            self.zero_distance,
        )
    }
}

#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct UnseededAcoExperiment {
    pub ant_count: usize,
    pub rounds: usize,
    pub alpha: f64,
    pub beta: f64,
    pub roh: f64,
    #[serde(default)]
    pub q: Option<f64>,
    #[serde(default = "default_initial_pheromone")]
    pub initial_pheromone: f64,
    #[serde(default = "default_min_pheromone")]
    pub min_pheromone: f64,
    #[serde(default = "default_max_pheromone")]
    pub max_pheromone: f64,
    #[serde(default = "default_zero_distance")]
    pub zero_distance: f64,
}

impl Fix<AcoExperiment> for UnseededAcoExperiment {
    fn to_fixed(&self) -> AcoExperiment {
        AcoExperiment {
            seed: (os_random_seed() >> 64) as u64,
            ant_count: self.ant_count,
            rounds: self.rounds,
            alpha: self.alpha,
            beta: self.beta,
            roh: self.roh,
            q: self.q,
            initial_pheromone: self.initial_pheromone,
            min_pheromone: self.min_pheromone,
            max_pheromone: self.max_pheromone,
            zero_distance: self.zero_distance,
        }
    }
}

fn default_initial_pheromone() -> f64 {
    Params::default().initial_pheromone
}

fn default_min_pheromone() -> f64 {
    Params::default().min_pheromone
}

fn default_max_pheromone() -> f64 {
    Params::default().max_pheromone
}

fn default_zero_distance() -> f64 {
    Params::default().zero_distance
}
