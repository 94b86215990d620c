use spotify_history_sync::config::{DatabaseConfig, PathsConfig};
use spotify_history_sync::table::PLAY_HISTORY_TABLE;
use spotify_history_sync::{
    DirectorySnapshotStore, LoadOutcome, MemoryTableStore, MySqlTableStore, SnapshotLoader,
};

pub async fn handle_load_command(
    paths: &PathsConfig,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshots = DirectorySnapshotStore::new(&paths.snapshot_dir);

    let outcome = if dry_run {
        log::info!("Dry run: the database will not be touched");
        let store = MemoryTableStore::new();
        let outcome = SnapshotLoader::new(&snapshots, &store).load().await;
        if let Some(table) = store.table(PLAY_HISTORY_TABLE) {
            log::info!("Would create table with:\n{}", table.create_table_sql());
        }
        outcome
    } else {
        let config = DatabaseConfig::from_env()?;
        log::debug!("Database config: {config:?}");
        let store = MySqlTableStore::connect_lazy(&config);
        SnapshotLoader::new(&snapshots, &store).load().await
    };

    // Load failures are already logged by the loader and leave the table untouched.
    if let LoadOutcome::Loaded { snapshot, rows } = &outcome {
        log::info!("Loaded {rows} rows from {}", snapshot.id);
    }

    Ok(())
}
