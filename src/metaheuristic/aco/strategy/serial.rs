use std::sync::Arc;

use crate::metaheuristic::aco::pheromone::PheromoneTable;
use crate::metaheuristic::aco::strategy::{ScheduleError, Scheduler};
use crate::metaheuristic::aco::{Ant, Colony};

/// Walks all ants one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serial;

impl Scheduler for Serial {
    fn name(&self) -> String {
        "serial".to_string()
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
        colony.walk_all(pheromones, &mut ants);

        Ok(ants)
    }
}
