//! Immutable, timestamp-named snapshot files.
//!
//! The snapshot directory works as an append-only log: every successful
//! extraction run adds one CSV file and nothing is ever modified or deleted.
//! Readers pick the newest file by filesystem creation time.

use crate::{PlayEvent, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

/// File name prefix of every snapshot.
pub const SNAPSHOT_PREFIX: &str = "spotify_enriched_";

fn snapshot_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^spotify_enriched_\d{8}_\d{6}\.csv$").expect("snapshot name pattern is valid")
    })
}

/// Whether `file_name` looks like a snapshot written by this crate.
pub fn is_snapshot_name(file_name: &str) -> bool {
    snapshot_name_pattern().is_match(file_name)
}

/// File name for a snapshot created at `created_at`.
pub fn snapshot_file_name(created_at: NaiveDateTime) -> String {
    format!("{SNAPSHOT_PREFIX}{}.csv", created_at.format("%Y%m%d_%H%M%S"))
}

/// A snapshot present in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// File name, e.g. `spotify_enriched_20240101_100000.csv`
    pub id: String,
    pub path: PathBuf,
    /// Filesystem creation time (modification time where creation time is unsupported)
    pub created: SystemTime,
}

/// Parsed content of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotContents {
    /// Header row, in file order
    pub columns: Vec<String>,
    pub events: Vec<PlayEvent>,
}

/// Storage for enriched event snapshots.
pub trait SnapshotStore {
    /// Persist `events` as a new snapshot.
    ///
    /// Returns `None` without creating anything when `events` is empty.
    fn write_snapshot(&self, events: &[PlayEvent]) -> Result<Option<SnapshotInfo>>;

    /// All snapshots, oldest first by creation time.
    fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>>;

    fn read_snapshot(&self, snapshot: &SnapshotInfo) -> Result<SnapshotContents>;

    /// The most recently created snapshot, if any.
    fn latest_snapshot(&self) -> Result<Option<SnapshotInfo>> {
        Ok(select_latest(self.list_snapshots()?))
    }
}

/// Pick the snapshot with the latest creation time; ties go to the greater name.
pub fn select_latest(snapshots: Vec<SnapshotInfo>) -> Option<SnapshotInfo> {
    snapshots
        .into_iter()
        .max_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)))
}

/// Snapshot store backed by CSV files in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotStore {
    dir: PathBuf,
}

impl DirectorySnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a snapshot named after `created_at` (second precision).
    ///
    /// A snapshot written within the same second as an earlier one replaces it.
    pub fn write_snapshot_at(
        &self,
        events: &[PlayEvent],
        created_at: NaiveDateTime,
    ) -> Result<Option<SnapshotInfo>> {
        if events.is_empty() {
            log::warn!("No events to write, skipping snapshot.");
            return Ok(None);
        }

        fs::create_dir_all(&self.dir)?;
        let id = snapshot_file_name(created_at);
        let path = self.dir.join(&id);

        let mut writer = csv::Writer::from_path(&path)?;
        for event in events {
            writer.serialize(event)?;
        }
        writer.flush()?;

        let created = creation_time(&fs::metadata(&path)?)?;
        log::info!("Enriched snapshot saved: {} ({} rows)", path.display(), events.len());

        Ok(Some(SnapshotInfo { id, path, created }))
    }
}

impl SnapshotStore for DirectorySnapshotStore {
    fn write_snapshot(&self, events: &[PlayEvent]) -> Result<Option<SnapshotInfo>> {
        self.write_snapshot_at(events, chrono::Local::now().naive_local())
    }

    fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_snapshot_name(&name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            snapshots.push(SnapshotInfo {
                id: name,
                path: entry.path(),
                created: creation_time(&metadata)?,
            });
        }

        snapshots.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(snapshots)
    }

    fn read_snapshot(&self, snapshot: &SnapshotInfo) -> Result<SnapshotContents> {
        let mut reader = csv::Reader::from_path(&snapshot.path)?;
        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let events = reader
            .deserialize::<PlayEvent>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(SnapshotContents { columns, events })
    }
}

fn creation_time(metadata: &fs::Metadata) -> Result<SystemTime> {
    Ok(metadata.created().or_else(|_| metadata.modified())?)
}
