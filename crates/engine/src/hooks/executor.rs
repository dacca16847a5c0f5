//! Hook execution
//!
//! Hooks of a phase run one after another in declaration order. The first
//! failure stops the phase.

use crate::process::{Invocation, ProcessRunner};
use lohup_config::{BtrfsAction, BtrfsHook, Hook, HookPhase, HookSet};
use lohup_core::{Error, Result};

/// Runs configured hooks through a [`ProcessRunner`]
pub struct HookRunner<'a> {
    hooks: &'a HookSet,
    runner: &'a dyn ProcessRunner,
}

impl<'a> HookRunner<'a> {
    /// Create a new hook runner
    pub fn new(hooks: &'a HookSet, runner: &'a dyn ProcessRunner) -> Self {
        Self { hooks, runner }
    }

    /// Run all hooks of `phase`
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookExecution`] for the first hook that fails; the
    /// remaining hooks of the phase are skipped.
    pub fn run_phase(&self, phase: HookPhase) -> Result<()> {
        let hooks = self.hooks.phase(phase);
        if hooks.is_empty() {
            tracing::debug!("No hooks defined for phase: {phase}");
            return Ok(());
        }

        tracing::info!("Running {phase} hooks (total: {})", hooks.len());

        for hook in hooks {
            let invocation = invocation_for(hook)?;
            let command = invocation.command_line();
            tracing::info!("Executing hook: {command}");

            self.runner.run(&invocation).map_err(|e| {
                Error::HookExecution(format!("{phase} hook '{command}' failed: {e}"))
            })?;
        }

        Ok(())
    }
}

/// Command line a hook runs
///
/// # Errors
///
/// Returns an error if a command hook cannot be split into arguments or is
/// empty, or a snapshot hook has no destination.
pub fn invocation_for(hook: &Hook) -> Result<Invocation> {
    match hook {
        Hook::Btrfs(btrfs) => btrfs_invocation(btrfs),
        Hook::Command(command) => {
            let argv = shell_words::split(&command.command).map_err(|e| {
                Error::HookExecution(format!(
                    "Failed to parse command '{}': {e}",
                    command.command
                ))
            })?;
            Invocation::from_argv(&argv)
                .map_err(|_| Error::HookExecution("Empty command".to_string()))
        }
    }
}

fn btrfs_invocation(hook: &BtrfsHook) -> Result<Invocation> {
    let invocation = Invocation::new("btrfs").arg("subvolume");
    match hook.action {
        BtrfsAction::Snapshot => {
            let snapshot = hook.snapshot.as_deref().ok_or_else(|| {
                Error::HookExecution("btrfs snapshot needs a destination".to_string())
            })?;
            Ok(invocation.args(["snapshot", hook.subvolume.as_str(), snapshot]))
        }
        BtrfsAction::Delete => Ok(invocation.args(["delete", hook.subvolume.as_str()])),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use lohup_config::CommandHook;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        fail: Option<&'static str>,
    }

    impl ProcessRunner for Recorder {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            let line = invocation.command_line();
            self.calls.borrow_mut().push(line.clone());
            if self.fail == Some(line.as_str()) {
                return Err(Error::Process {
                    command: invocation.program.clone(),
                    message: "exit status: 1".into(),
                });
            }
            Ok(())
        }
        fn pipe(&self, _: &Invocation, _: &Invocation) -> Result<()> {
            unreachable!()
        }
        fn read(&self, _: &Invocation) -> Result<String> {
            unreachable!()
        }
    }

    fn command(line: &str) -> Hook {
        Hook::Command(CommandHook {
            command: line.into(),
        })
    }

    #[test]
    fn test_btrfs_argv() {
        let snapshot = Hook::Btrfs(BtrfsHook {
            action: BtrfsAction::Snapshot,
            subvolume: "/home".into(),
            snapshot: Some("/snap/home".into()),
        });
        let inv = invocation_for(&snapshot).unwrap();
        assert_eq!(inv.program, "btrfs");
        assert_eq!(inv.args, ["subvolume", "snapshot", "/home", "/snap/home"]);

        let delete = Hook::Btrfs(BtrfsHook {
            action: BtrfsAction::Delete,
            subvolume: "/snap/home".into(),
            snapshot: None,
        });
        assert_eq!(
            invocation_for(&delete).unwrap().args,
            ["subvolume", "delete", "/snap/home"]
        );
    }

    #[test]
    fn test_command_is_split_with_quotes() {
        let inv =
            invocation_for(&command("mount -o ro '/dev/disk/by-label/My Backup' /mnt")).unwrap();
        assert_eq!(inv.program, "mount");
        assert_eq!(inv.args, ["-o", "ro", "/dev/disk/by-label/My Backup", "/mnt"]);

        assert!(invocation_for(&command("echo 'unterminated")).is_err());
        assert!(invocation_for(&command("   ")).is_err());
    }

    #[test]
    fn test_phase_runs_in_order_and_stops_at_failure() {
        let hooks = HookSet {
            before_all: vec![command("first"), command("second"), command("third")],
            after_all: vec![command("cleanup")],
        };
        let recorder = Recorder {
            fail: Some("second"),
            ..Recorder::default()
        };
        let runner = HookRunner::new(&hooks, &recorder);

        let err = runner.run_phase(HookPhase::BeforeAll).unwrap_err();
        assert!(matches!(err, Error::HookExecution(_)));
        assert!(err.to_string().contains("before-all hook 'second' failed"));
        assert_eq!(*recorder.calls.borrow(), ["first", "second"]);

        runner.run_phase(HookPhase::AfterAll).unwrap();
        assert_eq!(*recorder.calls.borrow(), ["first", "second", "cleanup"]);
    }

    #[test]
    fn test_empty_phase() {
        let hooks = HookSet::default();
        let recorder = Recorder::default();
        HookRunner::new(&hooks, &recorder)
            .run_phase(HookPhase::AfterAll)
            .unwrap();
        assert!(recorder.calls.borrow().is_empty());
    }
}
