//! Backup profiles (`[profiles.<name>]`)
//!
//! A profile either backs up a list of paths or streams the output of a
//! source command into the engine. Which one is decided by the presence of
//! `command`.

use crate::collect::ErrorCollector;
use crate::expander::Expander;
use lohup_core::{Error, Result};
use serde::Deserialize;

/// Profile backing up filesystem paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsProfile {
    /// Profile name
    pub name: String,
    /// Explicit repository link
    pub repo: Option<String>,
    /// Paths to back up, expanded
    pub paths: Vec<String>,
    /// Exclude patterns, expanded
    pub exclude_paths: Vec<String>,
    /// Extra engine arguments
    pub cli_args: Vec<String>,
}

/// Profile backing up the standard output of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProfile {
    /// Profile name
    pub name: String,
    /// Explicit repository link
    pub repo: Option<String>,
    /// Source command argv
    pub command: Vec<String>,
    /// Extra engine arguments
    pub cli_args: Vec<String>,
}

/// A configured backup job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    /// Back up paths
    Paths(PathsProfile),
    /// Back up a command's output
    Command(CommandProfile),
}

impl Profile {
    /// Profile name
    pub fn name(&self) -> &str {
        match self {
            Self::Paths(p) => &p.name,
            Self::Command(p) => &p.name,
        }
    }

    /// Repository named by the profile, if any
    pub fn repo(&self) -> Option<&str> {
        match self {
            Self::Paths(p) => p.repo.as_deref(),
            Self::Command(p) => p.repo.as_deref(),
        }
    }

    /// Extra engine arguments
    pub fn cli_args(&self) -> &[String] {
        match self {
            Self::Paths(p) => &p.cli_args,
            Self::Command(p) => &p.cli_args,
        }
    }

    /// Load one profile entry
    ///
    /// `command` may be a command line, split with shell quoting rules, or
    /// an argv list. Without it, `paths` must be non-empty.
    pub fn load(
        name: &str,
        value: toml::Value,
        expander: &Expander,
        collector: &mut ErrorCollector,
    ) -> Result<Option<Self>> {
        let raw: RawProfile = value
            .try_into()
            .map_err(|e: toml::de::Error| Error::Message(e.message().to_string()))?;

        if let Some(command) = raw.command.and_then(SourceCommand::into_argv) {
            return Ok(Some(Self::Command(CommandProfile {
                name: name.to_string(),
                repo: raw.repo,
                command: command?,
                cli_args: raw.cli_args,
            })));
        }

        if raw.paths.is_empty() {
            collector.error("no paths or command provided");
            return Ok(None);
        }

        let expand_all = |items: Vec<String>| -> Result<Vec<String>> {
            items
                .iter()
                .map(|item| expander.expand(item).map(|s| s.into_owned()))
                .collect()
        };

        Ok(Some(Self::Paths(PathsProfile {
            name: name.to_string(),
            repo: raw.repo,
            paths: expand_all(raw.paths)?,
            exclude_paths: expand_all(raw.exclude_paths)?,
            cli_args: raw.cli_args,
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProfile {
    repo: Option<String>,
    #[serde(default)]
    cli_args: Vec<String>,
    command: Option<SourceCommand>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    exclude_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceCommand {
    Line(String),
    Argv(Vec<String>),
}

impl SourceCommand {
    /// Argv for a non-empty command, `None` when empty
    fn into_argv(self) -> Option<Result<Vec<String>>> {
        match self {
            Self::Line(line) if line.trim().is_empty() => None,
            Self::Line(line) => Some(shell_words::split(&line).map_err(|e| {
                Error::Message(format!("field 'command': {e}"))
            })),
            Self::Argv(argv) if argv.is_empty() => None,
            Self::Argv(argv) => Some(Ok(argv)),
        }
    }
}
