//! Core types and utilities for lohup
//!
//! This is the foundation crate (Layer 0) that all other lohup crates depend on.
//! It provides:
//! - Base error types, including the aggregated configuration report
//! - Platform detection
//!
//! This crate has no dependencies on other lohup crates.

pub mod error;
pub mod platform;

pub use error::{AggregateError, Error, Result};
