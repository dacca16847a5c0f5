//! rustic adapter
//!
//! rustic reads its repository settings from a config profile. The adapter
//! writes `rustic.toml` into the build directory when prepared and removes it
//! when released; every invocation selects that profile with `-P`.

use super::restic::read_key;
use super::{BackupEngine, EngineKind, backup_prefix};
use crate::process::{Invocation, ProcessRunner};
use lohup_config::{Profile, Repository};
use lohup_core::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BINARY: &str = "rustic";
const PROFILE_NAME: &str = "rustic";

#[derive(Debug, Serialize)]
struct RusticConfig<'a> {
    repository: RepositorySection<'a>,
}

#[derive(Debug, Serialize)]
struct RepositorySection<'a> {
    password: String,
    repository: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<S3Options<'a>>,
}

#[derive(Debug, Serialize)]
struct S3Options<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_access_key: Option<String>,
    endpoint: &'a str,
    bucket: &'a str,
    root: &'a str,
    region: &'a str,
}

/// rustic bound to one repository
pub struct Rustic<'a> {
    repo: &'a Repository,
    conf_dir: PathBuf,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Rustic<'a> {
    /// Create the adapter, keeping its config profile in `conf_dir`
    pub fn new(repo: &'a Repository, conf_dir: &Path, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            repo,
            conf_dir: conf_dir.to_path_buf(),
            runner,
        }
    }

    /// Path of the generated config profile
    pub fn conf_file(&self) -> PathBuf {
        self.conf_dir.join(format!("{PROFILE_NAME}.toml"))
    }

    /// Render the config profile for the bound repository
    ///
    /// # Errors
    ///
    /// Returns an error if a key file cannot be read
    pub fn render_config(&self) -> Result<String> {
        let password = read_key(self.repo.repo_key_file())?;

        let repository = match self.repo {
            Repository::Local(local) => RepositorySection {
                password,
                repository: &local.path,
                options: None,
            },
            Repository::S3(s3) => {
                let optional_key = |file: &lohup_config::MaskedPath| {
                    (!file.is_empty()).then(|| read_key(file)).transpose()
                };
                RepositorySection {
                    password,
                    repository: "opendal:s3",
                    options: Some(S3Options {
                        access_key_id: optional_key(&s3.access_key_file)?,
                        secret_access_key: optional_key(&s3.secret_key_file)?,
                        endpoint: &s3.endpoint,
                        bucket: &s3.bucket,
                        root: &s3.path,
                        region: &s3.region,
                    }),
                }
            }
        };

        toml::to_string(&RusticConfig { repository })
            .map_err(|e| Error::Message(format!("Failed to render rustic config: {e}")))
    }

    fn write_config(&self, content: &str) -> io::Result<()> {
        fs::create_dir_all(&self.conf_dir)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(self.conf_file())?.write_all(content.as_bytes())
    }
}

impl BackupEngine for Rustic<'_> {
    fn kind(&self) -> EngineKind {
        EngineKind::Rustic
    }

    fn runner(&self) -> &dyn ProcessRunner {
        self.runner
    }

    fn command(&self, args: &[String]) -> Result<Invocation> {
        let profile = self.conf_dir.join(PROFILE_NAME);
        Ok(Invocation::new(BINARY)
            .arg("--log-level=warn")
            .arg("-P")
            .arg(profile.to_string_lossy())
            .args(args.iter().cloned()))
    }

    fn backup_args(&self, profile: &Profile) -> Vec<String> {
        let mut args = backup_prefix(profile);
        match profile {
            Profile::Paths(p) => {
                for exclude in &p.exclude_paths {
                    args.push("--glob".to_string());
                    args.push(format!("!{exclude}"));
                }
                args.extend(p.paths.iter().cloned());
            }
            Profile::Command(_) => args.push("-".to_string()),
        }
        args
    }

    fn prepare(&self) -> Result<()> {
        let content = self.render_config()?;
        self.write_config(&content).map_err(|e| {
            Error::Message(format!(
                "Failed to write {}: {e}",
                self.conf_file().display()
            ))
        })?;
        tracing::debug!("Wrote {}", self.conf_file().display());
        Ok(())
    }

    fn release(&self) {
        let file = self.conf_file();
        match fs::remove_file(&file) {
            Ok(()) => tracing::debug!("Removed {}", file.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {e}", file.display()),
        }
    }
}
