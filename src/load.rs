//! Loading the newest snapshot into the destination table.

use crate::snapshot::{SnapshotInfo, SnapshotStore};
use crate::store::TableStore;
use crate::table::TableData;
use crate::SyncError;

/// Outcome of one load run.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The destination table now holds exactly this snapshot's rows.
    Loaded { snapshot: SnapshotInfo, rows: u64 },
    /// The snapshot directory holds no snapshot; nothing was written.
    NoSnapshotFound,
    /// The snapshot could not be listed, read or parsed; nothing was written.
    ReadError(SyncError),
    /// Connecting to or writing the store failed.
    WriteError(SyncError),
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Replaces the destination table with the newest snapshot.
pub struct SnapshotLoader<'a, S: SnapshotStore + ?Sized, T: TableStore + ?Sized> {
    snapshots: &'a S,
    store: &'a T,
}

impl<'a, S: SnapshotStore + ?Sized, T: TableStore + ?Sized> SnapshotLoader<'a, S, T> {
    pub fn new(snapshots: &'a S, store: &'a T) -> Self {
        Self { snapshots, store }
    }

    pub async fn load(&self) -> LoadOutcome {
        log::info!("Starting load process...");

        let snapshot = match self.snapshots.latest_snapshot() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::error!("No snapshot file found");
                return LoadOutcome::NoSnapshotFound;
            }
            Err(e) => {
                log::error!("Failed to list snapshots: {e}");
                return LoadOutcome::ReadError(e);
            }
        };
        log::info!("Snapshot selected for load: {}", snapshot.path.display());

        let table = match self
            .snapshots
            .read_snapshot(&snapshot)
            .and_then(|contents| {
                log::info!("Rows read from snapshot: {}", contents.events.len());
                TableData::from_snapshot(&contents)
            }) {
            Ok(table) => table,
            Err(e) => {
                log::error!("Failed to read snapshot {}: {e}", snapshot.id);
                return LoadOutcome::ReadError(e);
            }
        };

        match self.store.replace_table(&table).await {
            Ok(rows) => {
                log::info!("Success! {rows} rows saved to table '{}'", table.name);
                LoadOutcome::Loaded { snapshot, rows }
            }
            Err(e) => {
                log::error!("Fatal error while saving to the database: {e}");
                LoadOutcome::WriteError(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::sample_event;
    use crate::snapshot::DirectorySnapshotStore;
    use crate::store::MemoryTableStore;
    use crate::table::PLAY_HISTORY_TABLE;
    use crate::Result;
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait(?Send)]
    impl TableStore for UnreachableStore {
        async fn replace_table(&self, _table: &TableData) -> Result<u64> {
            Err(SyncError::Store(sqlx::Error::PoolTimedOut))
        }
    }

    fn write_events(store: &DirectorySnapshotStore, count: usize) -> SnapshotInfo {
        let events: Vec<_> = (0..count)
            .map(|i| sample_event("2024-01-01T10:00:00.000Z", &format!("t{i}"), "a1"))
            .collect();
        store.write_snapshot(&events).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_no_snapshot_found() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path().join("data"));
        let store = MemoryTableStore::new();

        let outcome = SnapshotLoader::new(&snapshots, &store).load().await;

        assert!(matches!(outcome, LoadOutcome::NoSnapshotFound));
        assert!(store.table(PLAY_HISTORY_TABLE).is_none());
    }

    #[tokio::test]
    async fn test_loads_rows() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path());
        let written = write_events(&snapshots, 4);
        let store = MemoryTableStore::new();

        let outcome = SnapshotLoader::new(&snapshots, &store).load().await;

        match outcome {
            LoadOutcome::Loaded { snapshot, rows } => {
                assert_eq!(snapshot.id, written.id);
                assert_eq!(rows, 4);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.table(PLAY_HISTORY_TABLE).unwrap().row_count(), 4);
    }

    #[tokio::test]
    async fn test_loading_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path());
        write_events(&snapshots, 3);
        let store = MemoryTableStore::new();
        let loader = SnapshotLoader::new(&snapshots, &store);

        assert!(loader.load().await.is_success());
        let first = store.table(PLAY_HISTORY_TABLE).unwrap();
        assert!(loader.load().await.is_success());
        let second = store.table(PLAY_HISTORY_TABLE).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.row_count(), 3);
    }

    #[tokio::test]
    async fn test_truncated_snapshot_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("spotify_enriched_20240101_000000.csv"),
            "played_at,track_id\nnot-a-time,t1\n",
        )
        .unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path());
        let store = MemoryTableStore::new();

        let outcome = SnapshotLoader::new(&snapshots, &store).load().await;

        assert!(matches!(outcome, LoadOutcome::ReadError(_)));
        assert!(store.table(PLAY_HISTORY_TABLE).is_none());
    }

    #[tokio::test]
    async fn test_malformed_played_at_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("spotify_enriched_20240101_000000.csv"),
            "played_at,track_id,track_name,popularity,duration_ms,explicit,artist_id,\
             artist_name,album_name,album_image,release_date,artist_genre\n\
             not-a-time,t1,Track,50,180000,false,a1,Artist,Album,,2020,Pop\n",
        )
        .unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path());
        let store = MemoryTableStore::new();

        let outcome = SnapshotLoader::new(&snapshots, &store).load().await;

        assert!(matches!(outcome, LoadOutcome::ReadError(SyncError::Parse(_))));
        assert!(store.table(PLAY_HISTORY_TABLE).is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = DirectorySnapshotStore::new(dir.path());
        write_events(&snapshots, 2);

        let outcome = SnapshotLoader::new(&snapshots, &UnreachableStore).load().await;

        assert!(matches!(outcome, LoadOutcome::WriteError(SyncError::Store(_))));
    }
}
