use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::graph::import::Bounds;
use crate::graph::Weight;
use crate::metaheuristic::aco::{Optimizer, Params, Scheduler};

/// Wall clock time of every round of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    durations: Vec<Duration>,
}

impl Profile {
    pub fn record(&mut self, duration: Duration) {
        self.durations.push(duration);
    }

    pub fn count(&self) -> usize {
        self.durations.len()
    }

    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    pub fn average(&self) -> Option<Duration> {
        if self.durations.is_empty() {
            None
        } else {
            Some(self.total() / self.durations.len() as u32)
        }
    }

    pub fn min_max(&self) -> Option<(Duration, Duration)> {
        let min = self.durations.iter().min()?;
        let max = self.durations.iter().max()?;
        Some((*min, *max))
    }
}

/// One row of the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub timestamp: u64,
    pub problem: String,
    pub strategy: String,
    pub args: String,
    pub ants: usize,
    pub rounds: usize,
    pub best_length: Option<Weight>,
    pub lower_bound: Option<Weight>,
    pub upper_bound: Option<Weight>,
    pub rounds_timed: usize,
    pub total_us: u64,
    pub average_us: Option<u64>,
    pub min_us: Option<u64>,
    pub max_us: Option<u64>,
    pub alpha: f64,
    pub beta: f64,
    pub roh: f64,
    pub q: f64,
    pub initial_pheromone: f64,
    pub min_pheromone: f64,
    pub max_pheromone: f64,
    pub zero_distance: f64,
}

impl Report {
    /// Summarizes a finished run. The best length is left empty if no ant ever reached the goal.
    pub fn new<S: Scheduler>(
        problem: &str,
        optimizer: &Optimizer<S>,
        profile: &Profile,
        bounds: Option<Bounds>,
    ) -> Self {
        let best = optimizer.best_route();
        let Params {
            alpha,
            beta,
            roh,
            q,
            initial_pheromone,
            min_pheromone,
            max_pheromone,
            zero_distance,
        } = *optimizer.colony().params();
        let micros = |duration: Duration| duration.as_micros() as u64;

        Report {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
            problem: problem.to_string(),
            strategy: optimizer.strategy_name(),
            args: optimizer.strategy_args(),
            ants: optimizer.ant_count(),
            rounds: optimizer.round(),
            best_length: if best.is_connected() {
                best.length()
            } else {
                None
            },
            lower_bound: bounds.map(|bounds| bounds.lower),
            upper_bound: bounds.map(|bounds| bounds.upper),
            rounds_timed: profile.count(),
            total_us: micros(profile.total()),
            average_us: profile.average().map(micros),
            min_us: profile.min_max().map(|(min, _)| micros(min)),
            max_us: profile.min_max().map(|(_, max)| micros(max)),
            alpha,
            beta,
            roh,
            q,
            initial_pheromone,
            min_pheromone,
            max_pheromone,
            zero_distance,
        }
    }
}

/// Appends a report row to the csv file at `path`. Headers are written only if the
/// file is new or empty.
pub fn append_report(path: impl AsRef<Path>, report: &Report) -> Result<(), csv::Error> {
    let path = path.as_ref();
    let has_content = path
        .metadata()
        .map(|metadata| metadata.len() > 0)
        .unwrap_or(false);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file);
    writer.serialize(report)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DirectedGraph;
    use crate::metaheuristic::aco::Serial;
    use std::collections::BTreeMap;
    use std::fs;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn profile_statistics() {
        let mut profile = Profile::default();
        assert_eq!(profile.average(), None);
        assert_eq!(profile.min_max(), None);

        profile.record(ms(4));
        profile.record(ms(2));
        profile.record(ms(6));

        assert_eq!(profile.count(), 3);
        assert_eq!(profile.total(), ms(12));
        assert_eq!(profile.average(), Some(ms(4)));
        assert_eq!(profile.min_max(), Some((ms(2), ms(6))));
    }

    fn report() -> Report {
        let mut weights = BTreeMap::new();
        weights.insert((0, 1), 2);
        let graph = DirectedGraph::from_edges(2, vec![(0, 1)]).unwrap();
        let mut optimizer = Optimizer::new(
            graph,
            DirectedGraph::with_nodes(2),
            weights,
            vec![0, 0],
            Params::default(),
            Some(1),
            Serial,
        )
        .unwrap();
        let profile = optimizer.optimize_rounds(3).unwrap();

        Report::new(
            "pair",
            &optimizer,
            &profile,
            Some(Bounds { lower: 2, upper: 2 }),
        )
    }

    #[test]
    fn report_summarizes_run() {
        let report = report();

        assert_eq!(report.problem, "pair");
        assert_eq!(report.strategy, "serial");
        assert_eq!(report.ants, 2);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.rounds_timed, 3);
        assert_eq!(report.best_length, Some(2));
        assert_eq!(report.lower_bound, Some(2));
    }

    #[test]
    fn append_report_writes_headers_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let report = report();

        append_report(&path, &report).unwrap();
        append_report(&path, &report).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3, "Expected a header and two rows.");
        assert!(lines[0].starts_with("timestamp,problem,strategy,args,ants,rounds,best_length"));
        assert!(lines[1].contains(",pair,serial,,2,3,2,2,2,3,"));
    }
}
