//! Config command - View and manage configuration
//!
//! - Show the effective (merged) configuration
//! - Show configuration file paths
//! - Write a default configuration file (local or global)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use sigroute_config::{ConfigLoader, SolverConfig};

use super::print_info;
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Write ~/.sigroute/config.toml instead of ./.sigroute/config.toml
    #[arg(long)]
    global: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Explicit config file, if given
    pub explicit: Option<PathBuf>,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, config: SolverConfig, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, &config),
        ConfigCommand::Path(args) => execute_path(args, global),
        ConfigCommand::Init(args) => execute_init(args, global),
    }
}

fn execute_show(args: ShowArgs, config: &SolverConfig) -> Result<()> {
    if args.json {
        println!("{}", config.to_json()?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn execute_path(args: PathArgs, global: GlobalOptions) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&cwd);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().map(|p| p.exists()).unwrap_or(false),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
        explicit: global.config,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    println!("Configuration Paths");
    println!("===================\n");

    if let Some(ref gp) = paths.global {
        println!("Global: {} ({})", gp.display(), exists_label(paths.global_exists));
    } else {
        println!("Global: not available (no home directory)");
    }
    println!(
        "Local:  {} ({})",
        paths.local.display(),
        exists_label(paths.local_exists)
    );
    if let Some(ref explicit) = paths.explicit {
        println!("File:   {} (replaces local)", explicit.display());
    }

    Ok(())
}

fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();

    let path = if args.global {
        loader
            .init_global()
            .context("Failed to initialize global config")?
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        loader
            .init_local(&cwd)
            .context("Failed to initialize local config")?
    };

    print_info(&format!("Config written to {}", path.display()), global.quiet);
    Ok(())
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "not found"
    }
}
