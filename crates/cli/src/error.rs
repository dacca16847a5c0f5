//! Error types for CLI commands
//!
//! Commands surface library failures unchanged so the aggregated config
//! report and process failures keep their original wording.

use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Error raised by the config or engine layer
    #[error(transparent)]
    Lohup(#[from] lohup_core::Error),

    /// Writing command output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;
