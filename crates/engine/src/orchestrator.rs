//! Backup runs
//!
//! The [`Orchestrator`] binds profiles to repositories and the configured
//! engine, then runs the backups between the before-all and after-all hooks.
//! After-all hooks run on every exit path once the run has started.

use crate::adapters::{BackupEngine, EngineKind, EngineSession, engine_for};
use crate::hooks::HookRunner;
use crate::process::ProcessRunner;
use crate::snapshot::{SnapshotFormat, SnapshotListing};
use lohup_config::{Config, HookPhase, Profile, Repository};
use lohup_core::Result;

/// Drives backups for a loaded config
pub struct Orchestrator<'c, R> {
    config: &'c Config,
    runner: R,
}

impl<'c, R: ProcessRunner> Orchestrator<'c, R> {
    /// Create an orchestrator spawning processes through `runner`
    pub fn new(config: &'c Config, runner: R) -> Self {
        Self { config, runner }
    }

    /// The process runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Engine selected by the `engine` setting
    ///
    /// # Errors
    ///
    /// Returns [`lohup_core::Error::UnknownEngine`] for an unsupported name
    pub fn engine_kind(&self) -> Result<EngineKind> {
        self.config.settings().engine.parse()
    }

    fn engine(&self, repo: &'c Repository) -> Result<Box<dyn BackupEngine + '_>> {
        Ok(engine_for(
            self.engine_kind()?,
            repo,
            self.config.settings(),
            &self.runner,
        ))
    }

    /// Back up a single profile
    ///
    /// # Errors
    ///
    /// Fails before running anything if the profile is unknown or cannot be
    /// bound. Otherwise returns the first hook or engine failure; after-all
    /// hooks have run by then.
    pub fn backup(&self, profile: &str) -> Result<()> {
        let profile = self.config.profile(profile)?;
        let repo = self.config.resolve(profile)?;
        let engine = self.engine(repo)?;

        self.with_hooks(|| backup_profile(engine.as_ref(), profile))?;
        tracing::info!("Finished!");
        Ok(())
    }

    /// Back up every profile, in declaration order
    ///
    /// All bindings are resolved before any hook runs.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::backup`]. The first failing profile stops the run.
    pub fn backup_all(&self) -> Result<()> {
        let jobs = self
            .config
            .resolve_all()?
            .into_iter()
            .map(|(profile, repo)| -> Result<_> { Ok((profile, self.engine(repo)?)) })
            .collect::<Result<Vec<_>>>()?;

        self.with_hooks(|| {
            jobs.iter()
                .try_for_each(|(profile, engine)| backup_profile(engine.as_ref(), profile))
        })?;
        tracing::info!("Finished!");
        Ok(())
    }

    /// Run the engine against a named repository with raw arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is unknown or the engine fails
    pub fn invoke(&self, repo: &str, args: &[String]) -> Result<()> {
        let engine = self.engine(self.config.repository(repo)?)?;
        let session = EngineSession::open(engine.as_ref())?;
        session.engine().run(args)
    }

    /// List the snapshots of a named repository
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is unknown, the engine fails, or
    /// structured output cannot be parsed
    pub fn snapshots(&self, repo: &str, format: SnapshotFormat) -> Result<SnapshotListing> {
        let engine = self.engine(self.config.repository(repo)?)?;
        let session = EngineSession::open(engine.as_ref())?;
        session.engine().snapshots(format)
    }

    /// Run `body` between the before-all and after-all hooks
    ///
    /// A before-all failure skips `body`. When both `body` and the after-all
    /// hooks fail, the earlier error is returned and the later one logged.
    fn with_hooks<F>(&self, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let hooks = HookRunner::new(self.config.hooks(), &self.runner);

        let result = hooks.run_phase(HookPhase::BeforeAll).and_then(|()| body());
        let cleanup = hooks.run_phase(HookPhase::AfterAll);

        match (result, cleanup) {
            (Err(e), Err(cleanup_err)) => {
                tracing::error!("{cleanup_err}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), cleanup) => cleanup,
        }
    }
}

fn backup_profile(engine: &dyn BackupEngine, profile: &Profile) -> Result<()> {
    tracing::info!("Backing up {} with {}", profile.name(), engine.kind());
    let session = EngineSession::open(engine)?;
    session.engine().backup(profile)?;
    tracing::info!("Backup created successfully.");
    Ok(())
}
