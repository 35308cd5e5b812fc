//! Judge command - Replay a solution against its instance

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sigroute_core::{judge, Solution};

use super::read_problem;
use crate::GlobalOptions;

/// Arguments for the judge command
#[derive(Args, Debug)]
pub struct JudgeArgs {
    /// Problem input file
    input: PathBuf,

    /// Solution output file
    output: PathBuf,

    /// Output the full report as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the judge command
pub fn execute(args: JudgeArgs, _global: GlobalOptions) -> Result<()> {
    let problem = read_problem(Some(&args.input))?;
    let text = std::fs::read_to_string(&args.output)
        .with_context(|| format!("Failed to read output {}", args.output.display()))?;

    let solution = Solution::parse(&text, &problem).context("Failed to parse solution")?;
    let report = judge(&problem, &solution).context("Solution rejected")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Score = {}", report.score);
    }

    Ok(())
}
