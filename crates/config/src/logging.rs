//! Logging setup for the lohup CLI
//!
//! Compact terminal output plus an optional append-only log file, using
//! tracing. The terminal level also decides whether config loading fails fast
//! (see [`crate::LoadOptions::from_logger`]).

use lohup_core::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown by default
const TARGETS: [&str; 3] = ["lohup", "lohup_config", "lohup_engine"];

/// Set once the terminal layer is installed with debug output enabled
static TERMINAL_DEBUG: AtomicBool = AtomicBool::new(false);

/// Whether the terminal shows debug events
///
/// Only the terminal filter counts; a log file capturing debug events does
/// not change what the user sees.
pub fn terminal_debug() -> bool {
    TERMINAL_DEBUG.load(Ordering::Relaxed)
}

/// Build the terminal filter, honouring `RUST_LOG` when set
fn env_filter(verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = if verbose { "debug" } else { "info" };
    let directives = TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    EnvFilter::try_new(directives).map_err(|e| Error::Message(format!("Invalid log filter: {e}")))
}

/// Initialize the logging system
///
/// # Arguments
/// * `verbose` - Enable debug level logging (and fail-fast config loading)
/// * `log_file` - Optional path to append debug logs to
///
/// # Examples
/// ```ignore
/// init(false, None)?;
/// init(true, Some(Path::new("lohup.log")))?;
/// ```
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_ansi(true);

    let stdout_filter = env_filter(verbose)?;
    let debug = stdout_filter
        .max_level_hint()
        .is_some_and(|level| level >= LevelFilter::DEBUG);

    // No timestamps in normal mode
    let stdout_layer = if verbose {
        stdout_layer.with_filter(stdout_filter).boxed()
    } else {
        stdout_layer
            .without_time()
            .with_filter(stdout_filter)
            .boxed()
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let filter = EnvFilter::try_new("debug")
                .map_err(|e| Error::Message(format!("Invalid log filter: {e}")))?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty()
                    .with_filter(filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Message(format!("Failed to initialize logging: {e}")))?;

    TERMINAL_DEBUG.store(debug, Ordering::Relaxed);
    Ok(())
}
