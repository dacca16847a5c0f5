//! Backup engine adapters
//!
//! Each supported engine binary gets an adapter implementing [`BackupEngine`].
//! Adapters only translate a repository and a profile into command lines;
//! spawning is left to the [`ProcessRunner`] they were built with.
//!
//! The adapter is chosen by the `engine` setting alone, so every profile of a
//! run goes through the same engine.

pub mod restic;
pub mod rustic;

pub use self::restic::Restic;
pub use self::rustic::Rustic;

use crate::process::{Invocation, ProcessRunner};
use crate::snapshot::{SnapshotFormat, SnapshotListing, parse_snapshots};
use lohup_config::{Profile, Repository, Settings};
use lohup_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Supported engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// restic, configured through environment variables
    Restic,
    /// rustic, configured through a generated config file
    Rustic,
}

impl EngineKind {
    /// Name used in the `engine` setting
    pub fn name(&self) -> &'static str {
        match self {
            Self::Restic => "restic",
            Self::Rustic => "rustic",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "restic" => Ok(Self::Restic),
            "rustic" => Ok(Self::Rustic),
            other => Err(Error::UnknownEngine {
                name: other.to_string(),
            }),
        }
    }
}

/// A backup engine bound to one repository
pub trait BackupEngine {
    /// Engine kind
    fn kind(&self) -> EngineKind;

    /// Runner used to spawn the engine
    fn runner(&self) -> &dyn ProcessRunner;

    /// Engine invocation with the repository wiring applied
    fn command(&self, args: &[String]) -> Result<Invocation>;

    /// Arguments of the `backup` subcommand for a profile
    fn backup_args(&self, profile: &Profile) -> Vec<String>;

    /// Set up whatever the engine needs on disk before running
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Undo [`BackupEngine::prepare`]; must tolerate running twice
    fn release(&self) {}

    /// Run the engine with `args`
    fn run(&self, args: &[String]) -> Result<()> {
        self.runner().run(&self.command(args)?)
    }

    /// Run the engine with `args`, feeding it the stdout of `source`
    fn pipe_source_into(&self, args: &[String], source: &Invocation) -> Result<()> {
        self.runner().pipe(source, &self.command(args)?)
    }

    /// List the repository's snapshots
    fn snapshots(&self, format: SnapshotFormat) -> Result<SnapshotListing> {
        let mut args = vec!["snapshots".to_string(), "--compact".to_string()];
        if format == SnapshotFormat::Json {
            args.push("--json".to_string());
        }

        let output = self.runner().read(&self.command(&args)?)?;
        match format {
            SnapshotFormat::Text => Ok(SnapshotListing::Raw(output)),
            SnapshotFormat::Json => parse_snapshots(&output).map(SnapshotListing::Records),
        }
    }

    /// Back up one profile
    fn backup(&self, profile: &Profile) -> Result<()> {
        let args = self.backup_args(profile);
        match profile {
            Profile::Paths(_) => self.run(&args),
            Profile::Command(p) => {
                self.pipe_source_into(&args, &Invocation::from_argv(&p.command)?)
            }
        }
    }
}

/// `backup --tag <profile> <cli-args...>`, common to both engines
fn backup_prefix(profile: &Profile) -> Vec<String> {
    let mut args = vec![
        "backup".to_string(),
        "--tag".to_string(),
        profile.name().to_string(),
    ];
    args.extend(profile.cli_args().iter().cloned());
    args
}

/// Build the adapter for `kind`, bound to `repo`
pub fn engine_for<'a>(
    kind: EngineKind,
    repo: &'a Repository,
    settings: &'a Settings,
    runner: &'a dyn ProcessRunner,
) -> Box<dyn BackupEngine + 'a> {
    match kind {
        EngineKind::Restic => Box::new(Restic::new(repo, runner)),
        EngineKind::Rustic => Box::new(Rustic::new(repo, &settings.build_dir, runner)),
    }
}

/// Prepared engine, released when dropped
///
/// Covers every exit path, including errors and panics, between
/// [`EngineSession::open`] and the end of the scope.
pub struct EngineSession<'e> {
    engine: &'e dyn BackupEngine,
}

impl<'e> EngineSession<'e> {
    /// Prepare `engine` for use
    ///
    /// # Errors
    ///
    /// Returns whatever [`BackupEngine::prepare`] fails with; the engine is
    /// released before returning.
    pub fn open(engine: &'e dyn BackupEngine) -> Result<Self> {
        let session = Self { engine };
        engine.prepare()?;
        Ok(session)
    }

    /// The prepared engine
    pub fn engine(&self) -> &'e dyn BackupEngine {
        self.engine
    }
}

impl Drop for EngineSession<'_> {
    fn drop(&mut self) {
        self.engine.release();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use lohup_config::{CommandProfile, PathsProfile};
    use std::cell::Cell;

    #[test]
    fn test_engine_kind_parse() {
        assert_eq!("restic".parse::<EngineKind>().unwrap(), EngineKind::Restic);
        assert_eq!("rustic".parse::<EngineKind>().unwrap(), EngineKind::Rustic);
        let err = "borg".parse::<EngineKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported backup engine: \"borg\"");
        assert_eq!(EngineKind::Rustic.to_string(), "rustic");
    }

    #[test]
    fn test_backup_prefix() {
        let paths = Profile::Paths(PathsProfile {
            name: "home".into(),
            repo: None,
            paths: vec!["/home".into()],
            exclude_paths: vec![],
            cli_args: vec!["--one-file-system".into()],
        });
        assert_eq!(
            backup_prefix(&paths),
            ["backup", "--tag", "home", "--one-file-system"]
        );

        let command = Profile::Command(CommandProfile {
            name: "db".into(),
            repo: None,
            command: vec!["pg_dumpall".into()],
            cli_args: vec![],
        });
        assert_eq!(backup_prefix(&command), ["backup", "--tag", "db"]);
    }

    struct Counting {
        prepared: Cell<u32>,
        released: Cell<u32>,
        fail_prepare: bool,
    }

    impl ProcessRunner for Counting {
        fn run(&self, _: &Invocation) -> Result<()> {
            Ok(())
        }
        fn pipe(&self, _: &Invocation, _: &Invocation) -> Result<()> {
            Ok(())
        }
        fn read(&self, _: &Invocation) -> Result<String> {
            Ok(String::new())
        }
    }

    impl BackupEngine for Counting {
        fn kind(&self) -> EngineKind {
            EngineKind::Rustic
        }
        fn runner(&self) -> &dyn ProcessRunner {
            self
        }
        fn command(&self, args: &[String]) -> Result<Invocation> {
            Ok(Invocation::new("fake").args(args.iter().cloned()))
        }
        fn backup_args(&self, profile: &Profile) -> Vec<String> {
            backup_prefix(profile)
        }
        fn prepare(&self) -> Result<()> {
            self.prepared.set(self.prepared.get() + 1);
            if self.fail_prepare {
                return Err(Error::Message("no space left".into()));
            }
            Ok(())
        }
        fn release(&self) {
            self.released.set(self.released.get() + 1);
        }
    }

    fn counting(fail_prepare: bool) -> Counting {
        Counting {
            prepared: Cell::new(0),
            released: Cell::new(0),
            fail_prepare,
        }
    }

    #[test]
    fn test_session_releases_on_every_path() {
        let engine = counting(false);
        let result: Result<()> = (|| {
            let _session = EngineSession::open(&engine)?;
            Err(Error::Message("backup failed".into()))
        })();
        assert!(result.is_err());
        assert_eq!(engine.prepared.get(), 1);
        assert_eq!(engine.released.get(), 1);
    }

    #[test]
    fn test_session_releases_when_prepare_fails() {
        let engine = counting(true);
        assert!(EngineSession::open(&engine).is_err());
        assert_eq!(engine.released.get(), 1);
    }
}
