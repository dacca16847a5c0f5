//! Configuration for lohup
//!
//! This crate handles:
//! - `$NAME` variable expansion
//! - Scoped collection of validation errors
//! - Loading and validating the TOML config
//! - Binding profiles to repositories
//! - Default directories
//! - Logging initialization

pub mod collect;
pub mod config;
pub mod dirs;
pub mod expander;
pub mod hooks;
pub mod logging;
pub mod profile;
pub mod repository;
mod resolver;
pub mod settings;

// Re-export error types from core
pub use lohup_core::{Error, Result};

// Re-export main types
pub use collect::ErrorCollector;
pub use config::{Config, LoadOptions};
pub use dirs::{DEFAULT_CONFIG_FILE, default_build_dir};
pub use expander::{Expander, Variables};
pub use hooks::{BtrfsAction, BtrfsHook, CommandHook, Hook, HookPhase, HookSet};
pub use profile::{CommandProfile, PathsProfile, Profile};
pub use repository::{LocalRepository, MaskedPath, Repository, S3Repository};
pub use settings::Settings;
