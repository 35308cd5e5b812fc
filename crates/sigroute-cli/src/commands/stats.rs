//! Stats command - Describe an instance and its initial partition
//!
//! Builds the same initial field the search starts from and plays the
//! whole visitation order on it, giving the cover-only baseline score.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sigroute_config::SolverConfig;
use sigroute_core::{CacheMetrics, PartitionStats, ProblemStats, SearchDriver, SearchStats};

use super::{read_problem, to_search_config};
use crate::GlobalOptions;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Problem input file
    input: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Combined figures for one instance
#[derive(Debug, Serialize)]
pub struct InstanceReport {
    pub problem: ProblemStats,
    pub partition: PartitionStats,
    pub ties_accepted: usize,
    pub ties_rejected: usize,
    /// Reloads needed by the initial partition alone
    pub baseline_score: usize,
    pub cache: CacheMetrics,
}

/// Execute the stats command
pub fn execute(args: StatsArgs, config: SolverConfig, _global: GlobalOptions) -> Result<()> {
    let problem = read_problem(Some(&args.input))?;
    let problem_stats = problem.stats().context("Invalid graph")?;

    let driver = SearchDriver::new(to_search_config(&config));
    let mut search_stats = SearchStats::default();
    let mut field = driver
        .initial_field(&problem, &mut search_stats)
        .context("Failed to build initial partition")?;
    let baseline_score = field
        .play(&problem.order)
        .context("Visitation order is not routable")?;

    let report = InstanceReport {
        problem: problem_stats,
        partition: field.partition().stats(),
        ties_accepted: search_stats.ties_accepted,
        ties_rejected: search_stats.ties_rejected,
        baseline_score,
        cache: field.cache().metrics().clone(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &InstanceReport) {
    let p = &report.problem;
    let a = &report.partition;

    println!("Instance");
    println!("========\n");
    println!("Nodes:        {}", p.node_count);
    println!("Edges:        {}", p.edge_count);
    println!("Targets:      {}", p.target_count);
    println!("Degree:       max {}, mean {:.2}", p.max_degree, p.mean_degree);
    println!("Capacities:   A = {}, B = {}", p.capacity_a, p.capacity_b);

    println!("\nInitial partition");
    println!("=================\n");
    println!("Areas:        {}", a.area_count);
    println!("Directory:    {} / {}", a.directory_used, a.directory_capacity);
    println!("Covered:      {} / {}", a.covered_nodes, a.node_count);
    println!("Max overlap:  {}", a.max_membership);
    println!(
        "Ties:         {} accepted, {} rejected",
        report.ties_accepted, report.ties_rejected
    );
    println!(
        "Cache:        {} hits, {} misses ({:.1}% hit rate)",
        report.cache.hits,
        report.cache.misses,
        report.cache.hit_rate() * 100.0
    );
    println!("\nBaseline score: {}", report.baseline_score);
}
