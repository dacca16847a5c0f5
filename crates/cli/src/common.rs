//! Shared state handed to every command

use lohup_config::Config;
use lohup_engine::{DuctRunner, Orchestrator, ProcessRunner};

/// Loaded config plus the process runner commands spawn engines through
///
/// The runner is a type parameter so commands can be driven against a
/// recording runner in tests; the binary always uses [`DuctRunner`].
pub struct RuntimeContext<R = DuctRunner> {
    /// The validated configuration
    pub config: Config,
    runner: R,
}

impl RuntimeContext {
    /// Context spawning real processes
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, DuctRunner)
    }
}

impl<R: ProcessRunner> RuntimeContext<R> {
    /// Context spawning processes through `runner`
    pub fn with_runner(config: Config, runner: R) -> Self {
        Self { config, runner }
    }

    /// The process runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Orchestrator borrowing this context's config and runner
    pub fn orchestrator(&self) -> Orchestrator<'_, &R> {
        Orchestrator::new(&self.config, &self.runner)
    }
}
