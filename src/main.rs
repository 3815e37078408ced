use anyhow::{bail, Context, Result};
use glob::glob;
use std::path::PathBuf;
use tracing::info;

use sop_aco::experiment::run_experiment;
use sop_aco::experiment_config::ExperimentConfig;
use sop_aco::{cli, logging};

fn main() {
    if let Err(err) = run_main() {
        eprintln!("sop_aco error: {:?}", err);
        std::process::exit(1);
    }
}

fn run_main() -> Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in args.experiments.iter() {
        let entries =
            glob(pattern).with_context(|| format!("invalid glob pattern '{}'", pattern))?;
        for entry in entries {
            paths.push(entry.context("failed to read a matched path")?);
        }
    }
    if paths.is_empty() {
        bail!("no experiment file matched {:?}", args.experiments);
    }

    for path in paths {
        let config = ExperimentConfig::from_file(&path)
            .with_context(|| format!("failed to load experiment {}", path.display()))?;
        if config.finished {
            info!(experiment = %path.display(), "skipping finished experiment");
            continue;
        }

        let report = run_experiment(&config, !args.quiet)
            .with_context(|| format!("experiment {} failed", path.display()))?;
        println!(
            "{}: {} with {} ants, best length {} after {} rounds",
            path.display(),
            report.strategy,
            report.ants,
            report
                .best_length
                .map(|length| length.to_string())
                .unwrap_or_else(|| "-".to_string()),
            report.rounds
        );
    }

    Ok(())
}
