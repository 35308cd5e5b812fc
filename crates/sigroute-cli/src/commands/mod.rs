//! CLI command implementations

pub mod config;
pub mod gen;
pub mod judge;
pub mod solve;
pub mod stats;

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sigroute_config::{ConfigLoader, SolverConfig};
use sigroute_core::{CoverOrder, Problem, SearchConfig};

use crate::GlobalOptions;

/// Load configuration: global → local (or `--config`) → CLI overrides.
pub fn load_config(global: &GlobalOptions) -> Result<SolverConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    if let Some(ref config_path) = global.config {
        return loader
            .load_with_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    loader
        .load(&cwd, Some(&overrides))
        .context("Failed to load configuration")
}

/// Translate file-level settings into the driver's configuration.
pub fn to_search_config(config: &SolverConfig) -> SearchConfig {
    let search = &config.search;
    let partition = &config.partition;

    SearchConfig {
        time_limit: Duration::from_millis(search.time_limit_ms),
        play_reserve: Duration::from_millis(search.play_reserve_ms),
        sample_size: search.sample_size,
        augment_batch: search.augment_batch,
        eval_window: search.eval_window,
        workers: search.workers,
        seed: search.seed,
        cover_order: if partition.shuffle_cover {
            CoverOrder::Shuffled
        } else {
            CoverOrder::Ascending
        },
        chunk_overlap: partition.chunk_overlap,
        tie_order_hops: partition.tie_order_hops,
    }
}

/// Read and parse a problem from a file, or stdin when `path` is `None`.
pub fn read_problem(path: Option<&Path>) -> Result<Problem> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read input from stdin")?;
            text
        }
    };

    Problem::parse(&text).context("Failed to parse problem input")
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
