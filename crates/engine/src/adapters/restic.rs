//! restic adapter
//!
//! restic takes its repository location and credentials from environment
//! variables, so nothing is written to disk. S3 keys are read from their
//! files on every invocation.

use super::{BackupEngine, EngineKind, backup_prefix};
use crate::process::{Invocation, ProcessRunner};
use lohup_config::{MaskedPath, Profile, Repository};
use lohup_core::{Error, Result};
use std::fs;

const BINARY: &str = "restic";

/// restic bound to one repository
pub struct Restic<'a> {
    repo: &'a Repository,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Restic<'a> {
    /// Create the adapter
    pub fn new(repo: &'a Repository, runner: &'a dyn ProcessRunner) -> Self {
        Self { repo, runner }
    }

    /// Environment describing the repository to restic
    ///
    /// # Errors
    ///
    /// Returns an error if an S3 key file cannot be read
    pub fn environment(&self) -> Result<Vec<(&'static str, String)>> {
        let mut env = vec![(
            "RESTIC_PASSWORD_FILE",
            self.repo.repo_key_file().path().to_string_lossy().into_owned(),
        )];

        match self.repo {
            Repository::Local(local) => {
                env.push(("RESTIC_REPOSITORY", local.path.clone()));
            }
            Repository::S3(s3) => {
                if !s3.region.is_empty() {
                    env.push(("AWS_DEFAULT_REGION", s3.region.clone()));
                }
                if !s3.access_key_file.is_empty() {
                    env.push(("AWS_ACCESS_KEY_ID", read_key(&s3.access_key_file)?));
                }
                if !s3.secret_key_file.is_empty() {
                    env.push(("AWS_SECRET_ACCESS_KEY", read_key(&s3.secret_key_file)?));
                }
                env.push((
                    "RESTIC_REPOSITORY",
                    format!("s3:{}/{}/{}", s3.endpoint, s3.bucket, s3.relative_path()),
                ));
            }
        }

        Ok(env)
    }
}

/// Read a credential file, trimmed
pub(crate) fn read_key(file: &MaskedPath) -> Result<String> {
    fs::read_to_string(file.path())
        .map(|content| content.trim().to_string())
        .map_err(|e| Error::Message(format!("Failed to read key file {file}: {e}")))
}

impl BackupEngine for Restic<'_> {
    fn kind(&self) -> EngineKind {
        EngineKind::Restic
    }

    fn runner(&self) -> &dyn ProcessRunner {
        self.runner
    }

    fn command(&self, args: &[String]) -> Result<Invocation> {
        let mut invocation = Invocation::new(BINARY).args(args.iter().cloned());
        for (key, value) in self.environment()? {
            invocation = invocation.env(key, value);
        }
        Ok(invocation)
    }

    fn backup_args(&self, profile: &Profile) -> Vec<String> {
        let mut args = backup_prefix(profile);
        match profile {
            Profile::Paths(p) => {
                for exclude in &p.exclude_paths {
                    args.push("-e".to_string());
                    args.push(exclude.clone());
                }
                args.extend(p.paths.iter().cloned());
            }
            Profile::Command(_) => args.push("--stdin".to_string()),
        }
        args
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::process::DuctRunner;
    use lohup_config::{CommandProfile, LocalRepository, PathsProfile, S3Repository};
    use tempfile::TempDir;

    fn local() -> Repository {
        Repository::Local(LocalRepository {
            name: "disk".into(),
            path: "/srv/restic".into(),
            repo_key_file: MaskedPath::new("/etc/lohup/repo.key"),
            default: false,
        })
    }

    fn s3(dir: &TempDir) -> Repository {
        fs::write(dir.path().join("id"), "AKIA123\n").unwrap();
        fs::write(dir.path().join("secret"), "  s3cr3t  \n").unwrap();
        Repository::S3(S3Repository {
            name: "cloud".into(),
            endpoint: "https://s3.example.com".into(),
            region: "eu-west-1".into(),
            access_key_file: MaskedPath::new(dir.path().join("id")),
            secret_key_file: MaskedPath::new(dir.path().join("secret")),
            repo_key_file: MaskedPath::new("/etc/lohup/repo.key"),
            bucket: "backups".into(),
            path: "/hosts/nas".into(),
            default: true,
        })
    }

    #[test]
    fn test_local_environment() {
        let repo = local();
        let restic = Restic::new(&repo, &DuctRunner);
        let inv = restic.command(&["snapshots".to_string()]).unwrap();

        assert_eq!(inv.program, "restic");
        assert_eq!(inv.args, ["snapshots"]);
        assert_eq!(inv.env["RESTIC_PASSWORD_FILE"], "/etc/lohup/repo.key");
        assert_eq!(inv.env["RESTIC_REPOSITORY"], "/srv/restic");
        assert!(!inv.env.contains_key("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_s3_environment() {
        let dir = TempDir::new().unwrap();
        let repo = s3(&dir);
        let restic = Restic::new(&repo, &DuctRunner);
        let inv = restic.command(&[]).unwrap();

        assert_eq!(
            inv.env["RESTIC_REPOSITORY"],
            "s3:https://s3.example.com/backups/hosts/nas"
        );
        assert_eq!(inv.env["AWS_DEFAULT_REGION"], "eu-west-1");
        assert_eq!(inv.env["AWS_ACCESS_KEY_ID"], "AKIA123");
        assert_eq!(inv.env["AWS_SECRET_ACCESS_KEY"], "s3cr3t");
    }

    #[test]
    fn test_key_files_are_read_per_invocation() {
        let dir = TempDir::new().unwrap();
        let repo = s3(&dir);
        let restic = Restic::new(&repo, &DuctRunner);
        assert_eq!(restic.command(&[]).unwrap().env["AWS_ACCESS_KEY_ID"], "AKIA123");

        fs::write(dir.path().join("id"), "ROTATED").unwrap();
        assert_eq!(restic.command(&[]).unwrap().env["AWS_ACCESS_KEY_ID"], "ROTATED");

        fs::remove_file(dir.path().join("id")).unwrap();
        let err = restic.command(&[]).unwrap_err().to_string();
        assert!(err.contains("[masked]"), "{err}");
        assert!(!err.contains(&dir.path().display().to_string()), "{err}");
    }

    #[test]
    fn test_backup_args() {
        let repo = local();
        let restic = Restic::new(&repo, &DuctRunner);

        let paths = Profile::Paths(PathsProfile {
            name: "home".into(),
            repo: None,
            paths: vec!["/home".into(), "/root".into()],
            exclude_paths: vec!["/home/*/.cache".into()],
            cli_args: vec!["--one-file-system".into()],
        });
        assert_eq!(
            restic.backup_args(&paths),
            [
                "backup",
                "--tag",
                "home",
                "--one-file-system",
                "-e",
                "/home/*/.cache",
                "/home",
                "/root"
            ]
        );

        let command = Profile::Command(CommandProfile {
            name: "db".into(),
            repo: None,
            command: vec!["pg_dumpall".into()],
            cli_args: vec!["--stdin-filename".into(), "db.sql".into()],
        });
        assert_eq!(
            restic.backup_args(&command),
            ["backup", "--tag", "db", "--stdin-filename", "db.sql", "--stdin"]
        );
    }
}
