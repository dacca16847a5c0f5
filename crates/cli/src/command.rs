//! Command trait for the lohup CLI
//!
//! Every subcommand that needs a loaded config implements [`Command`]. The
//! `execute` method receives a [`RuntimeContext`] holding the config and the
//! process runner.

use crate::common::RuntimeContext;
use crate::error::Result;
use lohup_engine::ProcessRunner;

/// Trait for all lohup commands
///
/// # Example
///
/// ```rust,ignore
/// use clap::Args;
///
/// #[derive(Debug, Args)]
/// pub struct MyCommand {
///     #[arg(long)]
///     pub repo: String,
/// }
///
/// impl Command for MyCommand {
///     type Output = ();
///
///     fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<()> {
///         context.orchestrator().invoke(&self.repo, &[])?;
///         Ok(())
///     }
/// }
/// ```
pub trait Command {
    /// The type returned by this command
    type Output;

    /// Execute the command with the given runtime context
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if a config lookup, hook or engine process
    /// fails.
    fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<Self::Output>;
}
