mod pool;
mod serial;
mod spawn;

pub use pool::{Partition, Pool};
pub use serial::Serial;
pub use spawn::Spawn;

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::metaheuristic::aco::pheromone::PheromoneTable;
use crate::metaheuristic::aco::{Ant, Colony};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to spawn a worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("a worker thread panicked")]
    WorkerPanicked,
}

#[derive(Debug, PartialEq, Error)]
pub enum StrategyError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
    #[error("invalid argument '{args}' for strategy '{name}'")]
    InvalidArgument { name: String, args: String },
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("core count must be at least 1")]
    ZeroCores,
}

/// Decides how the ants of a round are walked.
pub trait Scheduler {
    /// Identifies the strategy in logs and reports.
    fn name(&self) -> String;

    /// The parametrization of the strategy, empty if it has none.
    fn args(&self) -> String;

    /// Walks every ant and returns them in the order they were given.
    fn walk(
        &mut self,
        colony: &Arc<Colony>,
        pheromones: &Arc<PheromoneTable>,
        ants: Vec<Ant>,
    ) -> Result<Vec<Ant>, ScheduleError>;

    /// Stops all threads the strategy keeps alive between rounds.
    fn shutdown(&mut self) -> Result<(), ScheduleError> {
        Ok(())
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn args(&self) -> String {
        (**self).args()
    }

    fn walk(
        &mut self,
        colony: &Arc<Colony>,
        pheromones: &Arc<PheromoneTable>,
        ants: Vec<Ant>,
    ) -> Result<Vec<Ant>, ScheduleError> {
        (**self).walk(colony, pheromones, ants)
    }

    fn shutdown(&mut self) -> Result<(), ScheduleError> {
        (**self).shutdown()
    }
}

/// Selects a strategy by the name it reports and its argument string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub args: String,
}

impl StrategyConfig {
    pub fn new(name: &str, args: &str) -> Self {
        StrategyConfig {
            name: name.to_string(),
            args: args.to_string(),
        }
    }

    /// Accepts `serial`, `parallel`, `threaded` with an optional core count and
    /// `batched_<k>` or `batched` with the batch size as argument.
    pub fn build(&self) -> Result<Box<dyn Scheduler>, StrategyError> {
        let name = self.name.trim();
        match name {
            "serial" => Ok(Box::new(Serial)),
            "parallel" => Ok(Box::new(Spawn)),
            "threaded" => {
                let cores = pool::parse_cores(&self.args).ok_or_else(|| self.invalid_argument())?;
                Ok(Box::new(Pool::threaded(Some(cores))?))
            }
            "batched" => Ok(Box::new(Pool::batched(self.parse_batch_size(&self.args)?)?)),
            _ => match name.strip_prefix("batched_") {
                Some(size) => Ok(Box::new(Pool::batched(self.parse_batch_size(size)?)?)),
                None => Err(StrategyError::UnknownStrategy(self.name.clone())),
            },
        }
    }

    fn parse_batch_size(&self, value: &str) -> Result<usize, StrategyError> {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| self.invalid_argument())
    }

    fn invalid_argument(&self) -> StrategyError {
        StrategyError::InvalidArgument {
            name: self.name.clone(),
            args: self.args.clone(),
        }
    }
}
