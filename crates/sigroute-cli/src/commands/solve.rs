//! Solve command - Run the partition search on one instance

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sigroute_config::SolverConfig;
use sigroute_core::SearchDriver;
use tracing::info;

use super::{print_info, read_problem, to_search_config};
use crate::GlobalOptions;

/// Arguments for the solve command
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Problem input file (stdin if omitted)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Solution output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Total wall-clock budget in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Run seed
    #[arg(long)]
    seed: Option<u64>,

    /// Candidates explored in parallel per round
    #[arg(long)]
    workers: Option<usize>,

    /// Print search statistics as JSON on stderr
    #[arg(long)]
    stats: bool,
}

/// Execute the solve command
pub fn execute(args: SolveArgs, mut config: SolverConfig, global: GlobalOptions) -> Result<()> {
    config.apply_overrides(&sigroute_config::ConfigOverrides {
        time_limit_ms: args.time_limit_ms,
        seed: args.seed,
        workers: args.workers,
        ..Default::default()
    });
    config.validate().context("Invalid solver settings")?;

    let problem = read_problem(args.input.as_deref())?;
    let driver = SearchDriver::new(to_search_config(&config));
    let outcome = driver.run(&problem).context("Search failed")?;

    let text = outcome.solution.to_string();
    match args.output {
        Some(ref path) => std::fs::write(path, &text)
            .with_context(|| format!("Failed to write solution {}", path.display()))?,
        None => print!("{}", text),
    }

    let stats = &outcome.stats;
    info!(
        score = stats.score,
        rounds = stats.rounds,
        improvements = stats.improvements,
        elapsed_ms = stats.elapsed_ms,
        "solve finished"
    );

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        print_info(&format!("Score = {}", stats.score), global.quiet);
    }

    Ok(())
}
