//! Backup repositories (`[repos.<name>]`)
//!
//! Two kinds exist: `local` (a path on disk) and `s3` (a bucket behind an
//! S3-compatible endpoint). Credential files are referenced by path and
//! must exist when the config is loaded; their paths never appear in
//! output.

use crate::collect::ErrorCollector;
use crate::expander::Expander;
use lohup_core::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";

/// Path to a credential file, hidden from display
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MaskedPath(PathBuf);

impl MaskedPath {
    /// Wrap a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The real path, for reading the file
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// True when no path was configured
    pub fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

impl fmt::Display for MaskedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[masked]")
    }
}

impl fmt::Debug for MaskedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MaskedPath([masked])")
    }
}

/// Check that `file` names an existing regular file
///
/// Returns the message to record, naming `field` but not the path.
pub fn ensure_file(file: &MaskedPath, field: &str) -> Option<String> {
    let problem = if file.is_empty() {
        "empty value".to_string()
    } else if !file.path().exists() {
        format!("file {file} not found")
    } else if !file.path().is_file() {
        format!("{file}: not a file")
    } else {
        return None;
    };
    Some(format!("field '{field}': {problem}"))
}

fn de_error(e: toml::de::Error) -> Error {
    Error::Message(e.message().to_string())
}

fn masked(expander: &Expander, value: Option<&str>) -> Result<MaskedPath> {
    Ok(MaskedPath::new(
        expander.expand_opt(value)?.unwrap_or_default(),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawLocal {
    path: Option<String>,
    repo_key_file: Option<String>,
    #[serde(default)]
    default: bool,
}

/// Repository on a locally mounted filesystem
#[derive(Debug, Clone)]
pub struct LocalRepository {
    /// Repository name (its key under `[repos]`)
    pub name: String,
    /// Repository location
    pub path: String,
    /// File holding the repository password
    pub repo_key_file: MaskedPath,
    /// Whether profiles without `repo` use this repository
    pub default: bool,
}

impl LocalRepository {
    /// Build from a `kind = "local"` table, recording field problems
    pub fn load(
        name: &str,
        value: toml::Value,
        expander: &Expander,
        collector: &mut ErrorCollector,
    ) -> Result<Self> {
        let raw: RawLocal = value.try_into().map_err(de_error)?;

        let repo = Self {
            name: name.to_string(),
            path: expander.expand_opt(raw.path.as_deref())?.unwrap_or_default(),
            repo_key_file: masked(expander, raw.repo_key_file.as_deref())?,
            default: raw.default,
        };

        if repo.path.is_empty() {
            collector.error("field 'path': not set");
        }
        if let Some(msg) = ensure_file(&repo.repo_key_file, "repo-key-file") {
            collector.error(msg);
        }
        Ok(repo)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawS3 {
    endpoint: Option<String>,
    #[serde(default)]
    region: String,
    access_key_file: Option<String>,
    secret_key_file: Option<String>,
    repo_key_file: Option<String>,
    bucket: Option<String>,
    path: Option<String>,
    #[serde(default)]
    default: bool,
}

/// Repository in an S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3Repository {
    /// Repository name (its key under `[repos]`)
    pub name: String,
    /// Endpoint URL
    pub endpoint: String,
    /// Region, empty when not set
    pub region: String,
    /// File holding the access key id, empty when not set
    pub access_key_file: MaskedPath,
    /// File holding the secret access key, empty when not set
    pub secret_key_file: MaskedPath,
    /// File holding the repository password
    pub repo_key_file: MaskedPath,
    /// Bucket name
    pub bucket: String,
    /// Path inside the bucket
    pub path: String,
    /// Whether profiles without `repo` use this repository
    pub default: bool,
}

impl S3Repository {
    /// Build from a `kind = "s3"` table, recording field problems
    pub fn load(
        name: &str,
        value: toml::Value,
        expander: &Expander,
        collector: &mut ErrorCollector,
    ) -> Result<Self> {
        let raw: RawS3 = value.try_into().map_err(de_error)?;

        let repo = Self {
            name: name.to_string(),
            endpoint: expander
                .expand(raw.endpoint.as_deref().unwrap_or(DEFAULT_S3_ENDPOINT))?
                .into_owned(),
            region: raw.region,
            access_key_file: masked(expander, raw.access_key_file.as_deref())?,
            secret_key_file: masked(expander, raw.secret_key_file.as_deref())?,
            repo_key_file: masked(expander, raw.repo_key_file.as_deref())?,
            bucket: expander.expand_opt(raw.bucket.as_deref())?.unwrap_or_default(),
            path: expander
                .expand(raw.path.as_deref().unwrap_or("/"))?
                .into_owned(),
            default: raw.default,
        };

        if repo.endpoint.is_empty() {
            collector.error("field 'endpoint': not set");
        }
        if repo.bucket.is_empty() {
            collector.error("field 'bucket': not set");
        }
        for (file, field) in [
            (&repo.access_key_file, "access-key-file"),
            (&repo.secret_key_file, "secret-key-file"),
        ] {
            if !file.is_empty()
                && let Some(msg) = ensure_file(file, field)
            {
                collector.error(msg);
            }
        }
        if let Some(msg) = ensure_file(&repo.repo_key_file, "repo-key-file") {
            collector.error(msg);
        }
        Ok(repo)
    }

    /// Bucket path without its leading slash
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

/// A configured repository
#[derive(Debug, Clone)]
pub enum Repository {
    /// Local filesystem repository
    Local(LocalRepository),
    /// S3 bucket repository
    S3(S3Repository),
}

impl Repository {
    /// Repository name
    pub fn name(&self) -> &str {
        match self {
            Self::Local(repo) => &repo.name,
            Self::S3(repo) => &repo.name,
        }
    }

    /// The `kind` tag this repository was declared with
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::S3(_) => "s3",
        }
    }

    /// Whether this repository is flagged as default
    pub fn is_default(&self) -> bool {
        match self {
            Self::Local(repo) => repo.default,
            Self::S3(repo) => repo.default,
        }
    }

    /// File holding the repository password
    pub fn repo_key_file(&self) -> &MaskedPath {
        match self {
            Self::Local(repo) => &repo.repo_key_file,
            Self::S3(repo) => &repo.repo_key_file,
        }
    }
}
