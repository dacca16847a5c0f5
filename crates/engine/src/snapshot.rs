//! Snapshot listings returned by the engines

use chrono::{DateTime, FixedOffset, TimeDelta};
use lohup_core::{Error, Result};
use serde::Deserialize;

/// Output format requested from `snapshots`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    /// The engine's own text table
    #[default]
    Text,
    /// JSON, parsed into [`Snapshot`] records
    Json,
}

/// Result of a snapshot listing
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotListing {
    /// Unparsed engine output
    Raw(String),
    /// Parsed records, oldest first
    Records(Vec<Snapshot>),
}

/// Statistics recorded when a snapshot was taken
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotSummary {
    /// Files not present in the parent snapshot
    pub files_new: u64,
    /// Files modified since the parent snapshot
    pub files_changed: u64,
    /// Files read during the backup
    pub total_files_processed: u64,
    /// Bytes added to the repository, before compression
    pub data_added: u64,
    /// Bytes added to the repository, after compression
    pub data_added_packed: u64,
    /// Bytes read during the backup
    pub total_bytes_processed: u64,
    /// When the backup finished
    pub backup_end: Option<DateTime<FixedOffset>>,
}

/// One snapshot in a repository
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    /// Full snapshot id
    pub id: String,
    /// Abbreviated id, when the engine reports one
    #[serde(default)]
    pub short_id: Option<String>,
    /// When the backup started
    pub time: DateTime<FixedOffset>,
    /// Host the backup was taken on
    #[serde(default)]
    pub hostname: String,
    /// Snapshot tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Backed up paths
    #[serde(default)]
    pub paths: Vec<String>,
    /// Backup statistics
    #[serde(default)]
    pub summary: Option<SnapshotSummary>,
}

impl Snapshot {
    /// Abbreviated id, as printed by the engines
    pub fn short_id(&self) -> &str {
        match &self.short_id {
            Some(short) => short,
            None => self.id.get(..8).unwrap_or(&self.id),
        }
    }

    /// Tags joined with `-`
    pub fn name(&self) -> String {
        self.tags.join("-")
    }

    /// Time between start and end of the backup
    pub fn duration(&self) -> Option<TimeDelta> {
        let end = self.summary.as_ref()?.backup_end?;
        Some(end.signed_duration_since(self.time))
    }

    /// Files added or modified since the parent snapshot
    pub fn changed_files(&self) -> u64 {
        self.summary
            .as_ref()
            .map_or(0, |s| s.files_new + s.files_changed)
    }

    /// Changed files as a share of all processed files
    pub fn changed_ratio(&self) -> Option<f64> {
        let summary = self.summary.as_ref()?;
        ratio(self.changed_files(), summary.total_files_processed)
    }

    /// Added bytes as a share of all processed bytes
    pub fn added_ratio(&self) -> Option<f64> {
        let summary = self.summary.as_ref()?;
        ratio(summary.data_added, summary.total_bytes_processed)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}

/// restic prints a flat array, rustic groups snapshots by host and paths
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Flat(Vec<Snapshot>),
    Grouped(Vec<(serde_json::Value, Vec<Snapshot>)>),
}

/// Parse `snapshots --json` output, oldest first
///
/// # Errors
///
/// Returns an error if the output matches neither listing layout
pub fn parse_snapshots(json: &str) -> Result<Vec<Snapshot>> {
    let listing: Listing = serde_json::from_str(json)
        .map_err(|e| Error::Message(format!("Failed to parse snapshot listing: {e}")))?;

    let mut snapshots = match listing {
        Listing::Flat(snapshots) => snapshots,
        Listing::Grouped(groups) => groups.into_iter().flat_map(|(_, s)| s).collect(),
    };
    snapshots.sort_by_key(|s| s.time);
    Ok(snapshots)
}
