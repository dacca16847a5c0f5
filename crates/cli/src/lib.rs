//! lohup CLI library
//!
//! This library contains the CLI logic for lohup, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lohup_config::{Config, DEFAULT_CONFIG_FILE, logging};
use std::path::PathBuf;

use command::Command;
use common::RuntimeContext;

/// lohup - config-driven backups with restic or rustic
#[derive(Parser, Debug)]
#[command(name = "lohup")]
#[command(about = "Run restic or rustic backups described by a TOML config")]
#[command(version)]
#[command(long_about = "Run restic or rustic backups described by a TOML config

Repositories, backup profiles and before/after hooks are declared once in
lohup.toml; lohup validates the whole file, then drives the selected engine.")]
pub struct Cli {
    /// Path to the config file
    #[arg(
        long,
        env = "LOHUP_CONFIG",
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Enable verbose output (shows DEBUG level logs, stops at the first config error)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "LOHUP_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for lohup CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pass arguments to the engine, bound to a repository
    #[command(visible_alias = "restic")]
    Engine(cmd::engine::EngineCommand),

    /// Back up one profile
    Backup(cmd::backup::BackupCommand),

    /// Back up every profile
    BackupAll(cmd::backup::BackupAllCommand),

    /// List the snapshots of a repository
    Snapshots(cmd::snapshots::SnapshotsCommand),
}

/// Main entry point for the CLI application
///
/// # Errors
///
/// Returns an error if logging cannot be initialized, the config fails to
/// load, or the command fails.
pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    tracing::debug!("Loading config from {}", cli.config.display());
    let config = Config::load(&cli.config)?;
    let context = RuntimeContext::new(config);

    execute_command(&cli.command, &context)
}

fn execute_command(command: &Commands, context: &RuntimeContext) -> Result<()> {
    match command {
        Commands::Engine(engine_cmd) => engine_cmd.execute(context)?,
        Commands::Backup(backup_cmd) => backup_cmd.execute(context)?,
        Commands::BackupAll(backup_all_cmd) => backup_all_cmd.execute(context)?,
        Commands::Snapshots(snapshots_cmd) => snapshots_cmd.execute(context)?,
    }
    Ok(())
}
