//! Configuration loading
//!
//! A config file is read once per invocation and turned into an immutable
//! [`Config`]. Missing or malformed files fail immediately. Everything past
//! the TOML parse is validated entry by entry, and all problems are reported
//! together as one [`Error::Config`].

use crate::collect::ErrorCollector;
use crate::expander::Expander;
use crate::hooks::HookSet;
use crate::profile::Profile;
use crate::repository::{LocalRepository, Repository, S3Repository};
use crate::settings::Settings;
use indexmap::IndexMap;
use lohup_core::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Options controlling a load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Propagate the first unexpected error instead of collecting it
    pub fail_fast: bool,
}

impl LoadOptions {
    /// Fail fast exactly when the terminal shows debug logs
    pub fn from_logger() -> Self {
        Self {
            fail_fast: crate::logging::terminal_debug(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    settings: Option<toml::Value>,
    #[serde(default)]
    repos: IndexMap<String, toml::Value>,
    hooks: Option<toml::Value>,
    #[serde(default)]
    profiles: IndexMap<String, toml::Value>,
}

/// Loaded lohup configuration
#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
    repos: IndexMap<String, Repository>,
    hooks: HookSet,
    profiles: IndexMap<String, Profile>,
    expander: Expander,
}

impl Config {
    /// Load configuration from a file
    ///
    /// Fail-fast mode follows the current log level, see
    /// [`LoadOptions::from_logger`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] or [`Error::Parse`] when the file
    /// cannot be used at all, and [`Error::Config`] listing every validation
    /// failure otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, LoadOptions::from_logger())
    }

    /// Load configuration from a file with explicit options
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!("Loading config from {}", path.display());
        Self::parse(&content, path, options)
    }

    /// Load configuration from a TOML string
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn from_toml_str(content: &str, options: LoadOptions) -> Result<Self> {
        Self::parse(content, Path::new("<string>"), options)
    }

    fn parse(content: &str, path: &Path, options: LoadOptions) -> Result<Self> {
        let raw: RawDocument = toml::from_str(content).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        Self::build(raw, options)
    }

    fn build(raw: RawDocument, options: LoadOptions) -> Result<Self> {
        let mut collector = ErrorCollector::new(options.fail_fast);

        let settings = match raw.settings {
            Some(value) => {
                match collector.scope("settings:", |c| Settings::load(value, c))? {
                    Some(settings) => settings,
                    None => return Err(collector.into_error()),
                }
            }
            None => Settings::defaults()?,
        };

        let expander = Expander::new(settings.globals.clone());

        let mut repos = IndexMap::with_capacity(raw.repos.len());
        for (name, value) in raw.repos {
            let label = format!("repo {name:?}:");
            let kind = value
                .get("kind")
                .and_then(toml::Value::as_str)
                .map(str::to_string);

            let repo = match kind.as_deref() {
                Some("local") => collector.scope(&label, |c| {
                    LocalRepository::load(&name, value, &expander, c).map(Repository::Local)
                })?,
                Some("s3") => collector.scope(&label, |c| {
                    S3Repository::load(&name, value, &expander, c).map(Repository::S3)
                })?,
                Some(other) => {
                    collector.error(format!("{label} unsupported kind: {other}"));
                    None
                }
                None => {
                    collector.error(format!("{label} repository type not set"));
                    None
                }
            };

            if let Some(repo) = repo {
                repos.insert(name, repo);
            }
        }
        if repos.is_empty() {
            collector.error("no repositories defined");
        }

        let hooks = match raw.hooks {
            Some(value) => collector
                .scope("hook:", |c| HookSet::load(value, &expander, c))?
                .unwrap_or_default(),
            None => HookSet::default(),
        };

        let mut profiles = IndexMap::with_capacity(raw.profiles.len());
        for (name, value) in raw.profiles {
            let loaded = collector.scope(&format!("profile {name:?}:"), |c| {
                Profile::load(&name, value, &expander, c)
            })?;
            if let Some(Some(profile)) = loaded {
                profiles.insert(name, profile);
            }
        }

        collector.finish()?;

        tracing::debug!(
            repos = repos.len(),
            profiles = profiles.len(),
            hooks = hooks.before_all.len() + hooks.after_all.len(),
            engine = %settings.engine,
            "Config loaded"
        );

        Ok(Self {
            settings,
            repos,
            hooks,
            profiles,
            expander,
        })
    }

    /// Process-wide settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Repositories in declaration order
    pub fn repos(&self) -> &IndexMap<String, Repository> {
        &self.repos
    }

    /// Configured hooks
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Profiles in declaration order
    pub fn profiles(&self) -> &IndexMap<String, Profile> {
        &self.profiles
    }

    /// Expander built from the global table
    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Look up a repository by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepository`] if no such repository exists
    pub fn repository(&self, name: &str) -> Result<&Repository> {
        self.repos
            .get(name)
            .ok_or_else(|| Error::UnknownRepository(name.to_string()))
    }

    /// Look up a profile by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProfile`] if no such profile exists
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| Error::UnknownProfile(name.to_string()))
    }
}
