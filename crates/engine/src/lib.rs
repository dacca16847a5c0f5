//! # lohup engine
//!
//! Runs external backup engines for a loaded lohup config.
//!
//! - **Process**: `Invocation` values and the `ProcessRunner` seam
//! - **Adapters**: restic and rustic, behind the `BackupEngine` trait
//! - **Snapshots**: parsed `snapshots --json` listings
//! - **Hooks**: before-all and after-all hook execution
//! - **Orchestrator**: single-profile and all-profile backup runs

pub mod adapters;
pub mod hooks;
pub mod orchestrator;
pub mod process;
pub mod snapshot;

// Re-export error types from core
pub use lohup_core::{Error, Result};

// Re-export commonly used types
pub use adapters::{BackupEngine, EngineKind, EngineSession, engine_for};
pub use hooks::HookRunner;
pub use orchestrator::Orchestrator;
pub use process::{DuctRunner, Invocation, ProcessRunner};
pub use snapshot::{Snapshot, SnapshotFormat, SnapshotListing, SnapshotSummary, parse_snapshots};
