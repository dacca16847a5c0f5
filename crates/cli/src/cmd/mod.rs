//! CLI command implementations

pub mod backup;
pub mod engine;
pub mod snapshots;
