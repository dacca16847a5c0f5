//! Hook system
//!
//! Hook configuration lives in `lohup_config::hooks`; this module runs the
//! configured hooks around a backup run.

pub mod executor;

pub use executor::{HookRunner, invocation_for};
