//! Base error types for lohup
//!
//! This module provides the foundation error types that all crates can use.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file does not exist
    #[error("Config {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),

    /// Config file could not be read or is not valid TOML
    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// One or more validation failures collected during a load pass
    #[error("Failed to parse TOML config")]
    Config(#[source] AggregateError),

    /// Expansion referenced a name absent from the variable table
    #[error("variable {token} is not defined")]
    UndefinedVariable {
        /// The exact token text, including the leading `$`
        token: String,
    },

    /// Text contains `$` but no `$NAME` reference
    #[error("malformed variable reference in {text:?}")]
    MalformedReference {
        /// The text that failed to expand
        text: String,
    },

    /// Profile cannot be bound to any repository
    #[error("No repo attached to profile: {profile:?}")]
    UnlinkedProfile {
        /// Profile name
        profile: String,
    },

    /// Profile name not present in the config
    #[error("Unknown backup profile: {0:?}")]
    UnknownProfile(String),

    /// Repository name not present in the config
    #[error("Unknown repo: {0:?}")]
    UnknownRepository(String),

    /// Configured engine name has no adapter
    #[error("Unsupported backup engine: {name:?}")]
    UnknownEngine {
        /// Engine name from the settings section
        name: String,
    },

    /// Child process could not be spawned or exited with a non-zero status
    #[error("Command '{command}' failed: {message}")]
    Process {
        /// Program name
        command: String,
        /// Failure description
        message: String,
    },

    /// Hook execution error
    #[error("Hook execution error: {0}")]
    HookExecution(String),

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// The aggregated report, if this is a validation failure
    pub fn aggregate(&self) -> Option<&AggregateError> {
        match self {
            Self::Config(report) => Some(report),
            _ => None,
        }
    }
}

/// Combined report of every failure recorded while validating a config
///
/// Displays as the recorded lines joined by newlines, each line already
/// carrying the labels of the scopes it was recorded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    lines: Vec<String>,
}

impl AggregateError {
    /// Create a report from already-prefixed lines
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Individual report lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consume the report, returning its lines
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

impl std::error::Error for AggregateError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
