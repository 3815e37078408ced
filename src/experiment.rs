use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::experiment_config::ExperimentConfig;
use crate::graph::import::{read_sop, ImportError};
use crate::metaheuristic::aco::supervisor::append_report;
use crate::metaheuristic::aco::{OptimizerError, Profile, Report, ScheduleError, StrategyError};
use crate::metaheuristic::Optimizer;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("failed to write report: {0}")]
    Report(#[from] csv::Error),
}

/// Loads the problem of `config`, runs all configured rounds and appends the resulting
/// report to the configured output file, if any.
pub fn run_experiment(
    config: &ExperimentConfig,
    show_progress: bool,
) -> Result<Report, ExperimentError> {
    let problem = read_sop(&config.problem)?.with_bounds(config.bounds);
    let name = if problem.name.is_empty() {
        config
            .problem
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        problem.name.clone()
    };

    let aco = config.algorithm.aco();
    let scheduler = config.strategy.build()?;
    let mut optimizer = Optimizer::from_problem(
        &problem,
        aco.ant_count,
        aco.params(&problem),
        Some(aco.seed as u128),
        scheduler,
    )?;
    info!(
        problem = %name,
        nodes = problem.node_count(),
        strategy = %optimizer.strategy_name(),
        args = %optimizer.strategy_args(),
        ants = aco.ant_count,
        rounds = aco.rounds,
        seed = aco.seed,
        "starting experiment"
    );

    let progress = if show_progress {
        ProgressBar::new(aco.rounds as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{elapsed_precise} [{bar:40}] {pos}/{len} rounds {msg}"),
    );

    let mut profile = Profile::default();
    for _ in 0..aco.rounds {
        let start = Instant::now();
        optimizer.optimize()?;
        profile.record(start.elapsed());

        progress.inc(1);
        if optimizer.best_route().is_connected() {
            if let Some(length) = optimizer.best_route().length() {
                progress.set_message(&format!("best {}", length));
            }
        }
    }
    optimizer.shutdown()?;
    progress.finish_and_clear();

    let report = Report::new(&name, &optimizer, &profile, problem.bounds);
    info!(
        problem = %name,
        best = ?report.best_length,
        total_us = report.total_us,
        "finished experiment"
    );
    if let Some(output) = &config.output {
        append_report(output, &report)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment_config::{AcoExperiment, AlgoConfig};
    use crate::metaheuristic::aco::StrategyConfig;
    use std::fs;
    use std::path::Path;

    const INSTANCE: &str = "NAME: line.sop
COMMENT: four nodes, 2 before 1
EDGE_WEIGHT_SECTION
4
0 1 5 9
1 0 -1 5
5 1 0 1
9 5 1 0
EOF
";

    fn config(dir: &Path, strategy: StrategyConfig) -> ExperimentConfig {
        let problem = dir.join("line.sop");
        fs::write(&problem, INSTANCE).unwrap();

        ExperimentConfig {
            finished: false,
            problem,
            output: Some(dir.join("report.csv")),
            bounds: None,
            strategy,
            algorithm: AlgoConfig::Aco(AcoExperiment {
                seed: 9,
                ant_count: 6,
                rounds: 15,
                alpha: 1.0,
                beta: 2.0,
                roh: 0.1,
                q: None,
                initial_pheromone: 1.0,
                min_pheromone: 0.01,
                max_pheromone: 10.0,
                zero_distance: 0.1,
            }),
        }
    }

    #[test]
    #[cfg_attr(feature = "loom", ignore)]
    fn run_experiment_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), StrategyConfig::new("batched_4", ""));

        let report = run_experiment(&config, false).unwrap();

        assert_eq!(report.problem, "line.sop");
        assert_eq!(report.strategy, "batched_4");
        assert_eq!(report.rounds, 15);
        assert_eq!(report.q, 9.0, "q defaults to the largest weight.");
        // 0 -> 2 -> 1 -> 3 is the only order respecting the precedence
        assert_eq!(report.best_length, Some(11));

        let content = fs::read_to_string(dir.path().join("report.csv")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn run_experiment_with_unknown_strategy_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), StrategyConfig::new("annealing", ""));

        assert!(matches!(
            run_experiment(&config, false),
            Err(ExperimentError::Strategy(StrategyError::UnknownStrategy(_)))
        ));
    }

    #[test]
    fn run_experiment_with_missing_problem_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), StrategyConfig::new("serial", ""));
        config.problem = dir.path().join("missing.sop");

        assert!(matches!(
            run_experiment(&config, false),
            Err(ExperimentError::Import(ImportError::MissingFile(_)))
        ));
    }
}
