//! Gen command - Write seeded random instances
//!
//! A single instance goes to `--output` or stdout. With `--dir`, seeds
//! `seed..seed + count` are written as `<dir>/<seed:04>.txt`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use sigroute_core::{generate, GeneratorConfig, Problem};
use tracing::debug;

use super::print_info;
use crate::GlobalOptions;

/// Arguments for the gen command
#[derive(Args, Debug)]
pub struct GenArgs {
    /// First seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of consecutive seeds to generate
    #[arg(long, default_value_t = 1)]
    count: u64,

    /// Number of nodes
    #[arg(long, default_value_t = sigroute_core::generate::DEFAULT_NODE_COUNT)]
    nodes: usize,

    /// Number of targets
    #[arg(long, default_value_t = sigroute_core::generate::DEFAULT_TARGET_COUNT)]
    targets: usize,

    /// Directory length (drawn from the seed if omitted)
    #[arg(long)]
    capacity_a: Option<usize>,

    /// Buffer length (drawn from the seed if omitted)
    #[arg(long)]
    capacity_b: Option<usize>,

    /// Instance output file (stdout if omitted)
    #[arg(long, short = 'o', conflicts_with = "dir")]
    output: Option<PathBuf>,

    /// Directory receiving one file per seed
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl GenArgs {
    fn shape(&self) -> GeneratorConfig {
        GeneratorConfig {
            node_count: self.nodes,
            target_count: self.targets,
            capacity_a: self.capacity_a,
            capacity_b: self.capacity_b,
        }
    }
}

/// Execute the gen command
pub fn execute(args: GenArgs, global: GlobalOptions) -> Result<()> {
    let shape = args.shape();

    let Some(ref dir) = args.dir else {
        if args.count != 1 {
            bail!("--count {} needs --dir", args.count);
        }
        let text = instance(args.seed, &shape)?.to_string();
        match args.output {
            Some(ref path) => {
                std::fs::write(path, &text)
                    .with_context(|| format!("Failed to write instance {}", path.display()))?;
                print_info(&format!("Instance written to {}", path.display()), global.quiet);
            }
            None => print!("{}", text),
        }
        return Ok(());
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    for seed in args.seed..args.seed + args.count {
        let path = dir.join(format!("{:04}.txt", seed));
        std::fs::write(&path, instance(seed, &shape)?.to_string())
            .with_context(|| format!("Failed to write instance {}", path.display()))?;
        debug!(seed, path = %path.display(), "instance written");
    }
    print_info(
        &format!("{} instances written to {}", args.count, dir.display()),
        global.quiet,
    );
    Ok(())
}

fn instance(seed: u64, shape: &GeneratorConfig) -> Result<Problem> {
    generate(seed, shape).with_context(|| format!("Failed to generate instance for seed {}", seed))
}
