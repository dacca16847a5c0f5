//! Hook configuration
//!
//! Hooks live in two ordered lists, `[[hooks.before-all]]` and
//! `[[hooks.after-all]]`, and run around a backup run in declaration order.
//! Each entry picks its variant with `kind`:
//!
//! ```toml
//! [[hooks.before-all]]
//! kind = "btrfs"
//! action = "snapshot"
//! subvolume = "/home"
//! snapshot = "$BDIR/home"
//!
//! [[hooks.after-all]]
//! kind = "command"
//! command = "umount /mnt/backup"
//! ```

use crate::collect::ErrorCollector;
use crate::expander::Expander;
use lohup_core::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Hook execution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Before any backup of the run
    BeforeAll,
    /// After every backup of the run, even a failed one
    AfterAll,
}

impl HookPhase {
    /// Key of the phase list in the `[hooks]` table
    pub fn name(&self) -> &'static str {
        match self {
            HookPhase::BeforeAll => "before-all",
            HookPhase::AfterAll => "after-all",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action performed by a btrfs hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtrfsAction {
    /// `btrfs subvolume snapshot <subvolume> <snapshot>`
    Snapshot,
    /// `btrfs subvolume delete <subvolume>`
    Delete,
}

impl FromStr for BtrfsAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snapshot" => Ok(Self::Snapshot),
            "delete" => Ok(Self::Delete),
            other => Err(Error::Message(format!("unsupported action: {other}"))),
        }
    }
}

/// Hook running an arbitrary command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHook {
    /// Command line, split into argv when the hook runs
    pub command: String,
}

/// Hook creating or deleting a btrfs subvolume snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtrfsHook {
    /// Action to perform
    pub action: BtrfsAction,
    /// Source subvolume, or the subvolume to delete
    pub subvolume: String,
    /// Snapshot destination, set for [`BtrfsAction::Snapshot`]
    pub snapshot: Option<String>,
}

/// A configured hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hook {
    /// Generic command
    Command(CommandHook),
    /// btrfs snapshot action
    Btrfs(BtrfsHook),
}

#[derive(Debug, Deserialize)]
struct RawCommandHook {
    command: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBtrfsHook {
    action: Option<String>,
    subvolume: Option<String>,
    snapshot: Option<String>,
}

fn de_error(e: toml::de::Error) -> Error {
    Error::Message(e.message().to_string())
}

impl CommandHook {
    fn load(value: toml::Value, expander: &Expander) -> Result<Self> {
        let raw: RawCommandHook = value.try_into().map_err(de_error)?;
        let command = raw
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Message("field 'command': not set".to_string()))?;
        Ok(Self {
            command: expander.expand(&command)?.into_owned(),
        })
    }
}

impl BtrfsHook {
    /// Returns `Ok(None)` when a field problem was recorded
    fn load(
        value: toml::Value,
        expander: &Expander,
        collector: &mut ErrorCollector,
    ) -> Result<Option<Self>> {
        let raw: RawBtrfsHook = value.try_into().map_err(de_error)?;

        let action = match raw.action.as_deref() {
            Some(action) => match action.parse::<BtrfsAction>() {
                Ok(action) => Some(action),
                Err(e) => {
                    collector.error(e.to_string());
                    None
                }
            },
            None => {
                collector.error("field 'action': not set");
                None
            }
        };
        let subvolume = expander
            .expand_opt(raw.subvolume.as_deref())?
            .unwrap_or_default();
        let snapshot = expander.expand_opt(raw.snapshot.as_deref())?;

        if subvolume.is_empty() {
            collector.error("field 'subvolume': not set");
        }
        if action == Some(BtrfsAction::Snapshot) && snapshot.as_deref().is_none_or(str::is_empty) {
            collector.error("field 'snapshot': not set");
        }

        Ok(action.map(|action| Self {
            action,
            subvolume,
            snapshot,
        }))
    }
}

/// Ordered hook lists for both phases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    /// Hooks run before the backups
    pub before_all: Vec<Hook>,
    /// Hooks run after the backups
    pub after_all: Vec<Hook>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawHookSet {
    #[serde(default)]
    before_all: Vec<toml::Value>,
    #[serde(default)]
    after_all: Vec<toml::Value>,
}

impl HookSet {
    /// Check if there are no hooks defined
    pub fn is_empty(&self) -> bool {
        self.before_all.is_empty() && self.after_all.is_empty()
    }

    /// Hooks of one phase, in declaration order
    pub fn phase(&self, phase: HookPhase) -> &[Hook] {
        match phase {
            HookPhase::BeforeAll => &self.before_all,
            HookPhase::AfterAll => &self.after_all,
        }
    }

    /// Load the `[hooks]` table
    ///
    /// An entry with an unknown `kind` is recorded as
    /// `Unsupported <phase>: <kind>` and skipped; field problems inside an
    /// entry are recorded under `<phase> <kind>:`.
    pub fn load(
        value: toml::Value,
        expander: &Expander,
        collector: &mut ErrorCollector,
    ) -> Result<Self> {
        let raw: RawHookSet = value.try_into().map_err(de_error)?;

        Ok(Self {
            before_all: load_phase(HookPhase::BeforeAll, raw.before_all, expander, collector)?,
            after_all: load_phase(HookPhase::AfterAll, raw.after_all, expander, collector)?,
        })
    }
}

fn load_phase(
    phase: HookPhase,
    entries: Vec<toml::Value>,
    expander: &Expander,
    collector: &mut ErrorCollector,
) -> Result<Vec<Hook>> {
    let mut hooks = Vec::with_capacity(entries.len());

    for entry in entries {
        let kind = entry
            .get("kind")
            .and_then(toml::Value::as_str)
            .map(str::to_string);

        let hook = match kind.as_deref() {
            Some("command") => collector.scope(&format!("{phase} command:"), |_| {
                CommandHook::load(entry, expander).map(Hook::Command)
            })?,
            Some("btrfs") => collector
                .scope(&format!("{phase} btrfs:"), |c| {
                    BtrfsHook::load(entry, expander, c).map(|hook| hook.map(Hook::Btrfs))
                })?
                .flatten(),
            Some(other) => {
                collector.error(format!("Unsupported {phase}: {other}"));
                None
            }
            None => {
                collector.error(format!("Unsupported {phase}: kind not set"));
                None
            }
        };

        hooks.extend(hook);
    }

    Ok(hooks)
}
