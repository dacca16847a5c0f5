//! Engine command implementation
//!
//! Run the configured engine bound to a named repository, passing the
//! remaining arguments through untouched.

use clap::Args;
use lohup_engine::ProcessRunner;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;

/// Engine command arguments
#[derive(Debug, Args)]
pub struct EngineCommand {
    /// Repository to run against
    #[arg(long, value_name = "NAME")]
    pub repo: String,

    /// Arguments passed to the engine unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Command for EngineCommand {
    type Output = ();

    fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<()> {
        context.orchestrator().invoke(&self.repo, &self.args)?;
        Ok(())
    }
}
