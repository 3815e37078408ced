use std::sync::Arc;
use std::thread;

use crate::metaheuristic::aco::pheromone::PheromoneTable;
use crate::metaheuristic::aco::strategy::{ScheduleError, Scheduler};
use crate::metaheuristic::aco::{Ant, Colony};

/// Spawns one scoped thread per ant every round and joins all of them before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spawn;

impl Scheduler for Spawn {
    fn name(&self) -> String {
        "parallel".to_string()
    }

    fn args(&self) -> String {
        String::new()
    }

    fn walk(
        &mut self,
        colony: &Arc<Colony>,
        pheromones: &Arc<PheromoneTable>,
        mut ants: Vec<Ant>,
    ) -> Result<Vec<Ant>, ScheduleError> {
        let colony: &Colony = colony;
        let pheromones: &PheromoneTable = pheromones;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(ants.len());
            let mut error = None;
            for (id, ant) in ants.iter_mut().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("ant-{}", id))
                    .spawn_scoped(scope, move || colony.walk(pheromones, ant));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        error = Some(ScheduleError::Spawn(err));
                        break;
                    }
                }
            }

            for handle in handles {
                if handle.join().is_err() && error.is_none() {
                    error = Some(ScheduleError::WorkerPanicked);
                }
            }

            match error {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })?;

        Ok(ants)
    }
}
