//! Backup commands
//!
//! `backup` runs one profile, `backup-all` runs every profile in declaration
//! order. Both run between the before-all and after-all hooks.

use clap::Args;
use lohup_engine::ProcessRunner;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;

/// Backup command arguments
#[derive(Debug, Args)]
pub struct BackupCommand {
    /// Profile to back up
    #[arg(value_name = "PROFILE")]
    pub profile: String,
}

impl Command for BackupCommand {
    type Output = ();

    fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<()> {
        context.orchestrator().backup(&self.profile)?;
        Ok(())
    }
}

/// Backup-all command arguments
#[derive(Debug, Args)]
pub struct BackupAllCommand {}

impl Command for BackupAllCommand {
    type Output = ();

    fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<()> {
        context.orchestrator().backup_all()?;
        Ok(())
    }
}
