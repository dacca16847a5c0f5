//! Snapshots command implementation
//!
//! Lists the snapshots of a repository. By default the engine's JSON output
//! is parsed and printed oldest first; `--raw` prints the engine's own text.

use chrono::{DateTime, TimeDelta, Utc};
use clap::Args;
use lohup_engine::{ProcessRunner, Snapshot, SnapshotFormat, SnapshotListing};
use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;

/// Snapshots command arguments
#[derive(Debug, Args)]
pub struct SnapshotsCommand {
    /// Repository to list
    #[arg(long, value_name = "NAME")]
    pub repo: String,

    /// Print the engine output unchanged
    #[arg(long)]
    pub raw: bool,
}

impl Command for SnapshotsCommand {
    type Output = ();

    fn execute<R: ProcessRunner>(&self, context: &RuntimeContext<R>) -> Result<()> {
        let format = if self.raw {
            SnapshotFormat::Text
        } else {
            SnapshotFormat::Json
        };
        let listing = context.orchestrator().snapshots(&self.repo, format)?;

        let mut out = io::stdout().lock();
        match listing {
            SnapshotListing::Raw(text) => out.write_all(text.as_bytes())?,
            SnapshotListing::Records(snapshots) => {
                print_snapshots(&mut out, &snapshots, Utc::now())?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Print one block per snapshot
///
/// `snapshots` are expected oldest first, as returned by
/// [`lohup_engine::parse_snapshots`].
pub fn print_snapshots<W: Write>(
    out: &mut W,
    snapshots: &[Snapshot],
    now: DateTime<Utc>,
) -> io::Result<()> {
    for snapshot in snapshots {
        writeln!(
            out,
            "Snapshot {} ({}):",
            snapshot.short_id(),
            snapshot.name().blue().italic()
        )?;

        let started = format_relative(snapshot.time.with_timezone(&Utc), now);
        match snapshot.duration() {
            Some(took) => writeln!(
                out,
                "\tStarted: {} (took {})",
                started.blue(),
                format_duration(took)
            )?,
            None => writeln!(out, "\tStarted: {}", started.blue())?,
        }

        if let Some(summary) = &snapshot.summary {
            writeln!(
                out,
                "\tFiles changed (since previous): {} ({})",
                snapshot.changed_files(),
                format_percent(snapshot.changed_ratio()).blue()
            )?;
            writeln!(
                out,
                "\tDiff size: {}, unpacked: {} ({})",
                format_bytes(summary.data_added_packed),
                format_bytes(summary.data_added),
                format_percent(snapshot.added_ratio()).blue()
            )?;
        }

        writeln!(out, "\tHost: {}", snapshot.hostname)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Format a byte count with binary units
///
/// # Examples
/// ```
/// assert_eq!(lohup::cmd::snapshots::format_bytes(1536), "1.5 KiB");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if bytes < 1024 {
        return format!("{bytes} Bytes");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Approximate length of a time span, e.g. `3 hours`
pub fn format_duration(delta: TimeDelta) -> String {
    let secs = delta.num_seconds().max(0);
    match secs {
        0..=1 => "a moment".to_string(),
        2..=59 => format!("{secs} seconds"),
        60..=119 => "a minute".to_string(),
        120..=3599 => format!("{} minutes", secs / 60),
        3600..=7199 => "an hour".to_string(),
        7200..=86_399 => format!("{} hours", secs / 3600),
        86_400..=172_799 => "a day".to_string(),
        _ => format!("{} days", secs / 86_400),
    }
}

/// Position of `time` relative to `now`, e.g. `3 hours ago`
pub fn format_relative(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(time);
    if delta < TimeDelta::zero() {
        format!("{} from now", format_duration(-delta))
    } else if delta.num_seconds() < 2 {
        "now".to_string()
    } else {
        format!("{} ago", format_duration(delta))
    }
}

fn format_percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}
