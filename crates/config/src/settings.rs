//! The `[settings]` section

use crate::collect::ErrorCollector;
use crate::dirs::default_build_dir;
use crate::expander::Variables;
use lohup_core::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Engine used when the settings section does not name one
pub const DEFAULT_ENGINE: &str = "restic";

/// Computed global holding the backup base directory
pub const BASE_DIR_VAR: &str = "BDIR";

/// Computed global holding the build directory
pub const BUILD_DIR_VAR: &str = "BUILDDIR";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSettings {
    #[serde(default)]
    backup_base_dir: Option<String>,
    #[serde(default)]
    tmp_dir: Option<String>,
    #[serde(default, alias = "globalvars")]
    globals: Variables,
    #[serde(default, alias = "subsystem-name")]
    engine: Option<String>,
}

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base directory for backups, exposed as `$BDIR`
    pub backup_base_dir: PathBuf,
    /// Scratch directory for generated engine files, exposed as `$BUILDDIR`
    pub build_dir: PathBuf,
    /// Global variable table, including the computed entries
    pub globals: Variables,
    /// Name of the engine every profile runs through
    pub engine: String,
}

impl Settings {
    /// Settings for a config without a `[settings]` section
    pub fn defaults() -> Result<Self> {
        let mut collector = ErrorCollector::new(false);
        let settings = Self::from_raw(RawSettings::default(), &mut collector)?;
        collector.finish()?;
        Ok(settings)
    }

    /// Load the `[settings]` section, recording invalid globals
    pub fn load(value: toml::Value, collector: &mut ErrorCollector) -> Result<Self> {
        let raw: RawSettings = value
            .try_into()
            .map_err(|e: toml::de::Error| Error::Message(e.message().to_string()))?;
        Self::from_raw(raw, collector)
    }

    fn from_raw(raw: RawSettings, collector: &mut ErrorCollector) -> Result<Self> {
        let backup_base_dir = match raw.backup_base_dir.filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };
        let build_dir = raw
            .tmp_dir
            .filter(|s| !s.is_empty())
            .map_or_else(default_build_dir, PathBuf::from);

        let mut globals = raw.globals;
        globals.insert(
            BASE_DIR_VAR.to_string(),
            backup_base_dir.to_string_lossy().into_owned(),
        );
        globals.insert(
            BUILD_DIR_VAR.to_string(),
            build_dir.to_string_lossy().into_owned(),
        );

        for (key, value) in &globals {
            if value.contains('$') {
                collector.error(format!(
                    "variable '{key}': nested references in globals are not allowed"
                ));
            }
        }

        Ok(Self {
            backup_base_dir,
            build_dir,
            globals,
            engine: raw.engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn parse(src: &str) -> toml::Value {
        toml::Value::Table(toml::from_str(src).unwrap())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::defaults().unwrap();
        assert_eq!(settings.engine, DEFAULT_ENGINE);
        assert_eq!(settings.build_dir, default_build_dir());
        assert_eq!(
            settings.backup_base_dir,
            std::env::current_dir().unwrap()
        );
        assert!(settings.globals.contains_key(BASE_DIR_VAR));
        assert!(settings.globals.contains_key(BUILD_DIR_VAR));
    }

    #[test]
    fn test_computed_globals_follow_overrides() {
        let mut collector = ErrorCollector::new(false);
        let settings = Settings::load(
            parse(
                r#"
backup-base-dir = "/srv/backup"
tmp-dir = "/var/tmp/lohup"
engine = "rustic"

[globals]
HOST = "nas"
"#,
            ),
            &mut collector,
        )
        .unwrap();

        assert!(collector.is_empty());
        assert_eq!(settings.engine, "rustic");
        assert_eq!(settings.globals["HOST"], "nas");
        assert_eq!(settings.globals[BASE_DIR_VAR], "/srv/backup");
        assert_eq!(settings.globals[BUILD_DIR_VAR], "/var/tmp/lohup");
    }

    #[test]
    fn test_legacy_key_names() {
        let mut collector = ErrorCollector::new(false);
        let settings = Settings::load(
            parse(
                r#"
subsystem-name = "rustic"

[globalvars]
A = "1"
"#,
            ),
            &mut collector,
        )
        .unwrap();
        assert_eq!(settings.engine, "rustic");
        assert_eq!(settings.globals["A"], "1");
    }

    #[test]
    fn test_nested_reference_is_recorded() {
        let mut collector = ErrorCollector::new(false);
        Settings::load(
            parse(
                r#"
[globals]
OK = "plain"
BAD = "$OK/more"
"#,
            ),
            &mut collector,
        )
        .unwrap();

        assert_eq!(
            collector.lines(),
            ["variable 'BAD': nested references in globals are not allowed"]
        );
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let mut collector = ErrorCollector::new(false);
        let err = Settings::load(parse("globals = 5"), &mut collector).unwrap_err();
        assert!(matches!(err, Error::Message(_)));
    }
}
