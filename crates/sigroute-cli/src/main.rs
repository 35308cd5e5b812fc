//! sigroute CLI - Partition search and solution judging
//!
//! A command-line interface for solving signal-routing instances, replaying
//! solutions through the judge and inspecting configuration.
//!
//! # Usage
//!
//! ```bash
//! # Solve an instance read from stdin, solution on stdout
//! sigroute solve < in/0000.txt > out/0000.txt
//!
//! # Score a solution
//! sigroute judge in/0000.txt out/0000.txt
//!
//! # Inspect the initial cover of an instance
//! sigroute stats in/0000.txt --json
//!
//! # Write instances for seeds 0..100
//! sigroute gen --count 100 --dir in
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sigroute_config::{ConfigOverrides, LogFormat, SolverConfig};
use tracing_subscriber::EnvFilter;

mod commands;

/// sigroute - Area partitioning and reload-minimizing routing
#[derive(Parser, Debug)]
#[command(name = "sigroute")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "SIGROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log format (text, json)
    #[arg(long, global = true, env = "SIGROUTE_LOG_FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

/// Parse log format from string
fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
        .map_err(|e: sigroute_config::ConfigError| e.to_string())
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        ConfigOverrides {
            log_level,
            log_format: self.log_format,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search a partition and write the operation log
    Solve(commands::solve::SolveArgs),

    /// Replay a solution and print its score
    Judge(commands::judge::JudgeArgs),

    /// Report graph and initial partition figures
    Stats(commands::stats::StatsArgs),

    /// Generate seeded random instances
    Gen(commands::gen::GenArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the stderr subscriber; `RUST_LOG` wins over the configured level.
fn init_tracing(config: &SolverConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            builder.with_ansi(true).finish(),
        )?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.global)?;
    init_tracing(&config)?;

    match cli.command {
        Commands::Solve(args) => commands::solve::execute(args, config, cli.global),
        Commands::Judge(args) => commands::judge::execute(args, cli.global),
        Commands::Stats(args) => commands::stats::execute(args, config, cli.global),
        Commands::Gen(args) => commands::gen::execute(args, cli.global),
        Commands::Config(cmd) => commands::config::execute(cmd, config, cli.global),
    }
}
