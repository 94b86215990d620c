use http_client::native::NativeClient;
use spotify_history_sync::auth::ensure_fresh_token;
use spotify_history_sync::config::{PathsConfig, SpotifyConfig};
use spotify_history_sync::{
    run_extraction, DirectorySnapshotStore, SpotifyApiClient, SpotifyAuth, StopReason,
    TokenPersistence,
};

pub async fn handle_extract_command(
    paths: &PathsConfig,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Starting extraction of up to {limit} plays...");

    let config = SpotifyConfig::from_env()?;
    let auth = SpotifyAuth::new(Box::new(NativeClient::new()), config);
    let persistence = TokenPersistence::new(&paths.token_cache);
    let token = ensure_fresh_token(&auth, &persistence).await?;

    let api = SpotifyApiClient::new(Box::new(NativeClient::new()), token.access_token);
    let snapshots = DirectorySnapshotStore::new(&paths.snapshot_dir);

    let report = run_extraction(&api, &snapshots, limit).await?;

    match &report.stop {
        StopReason::LimitReached => log::info!("Limit reached"),
        StopReason::Exhausted => log::info!("No more history available"),
        StopReason::ApiError(e) => log::error!("Extraction stopped early: {e}"),
    }
    log::info!("Extracted {} plays", report.extracted);

    if let Some(enrichment) = &report.enrichment {
        log::info!(
            "Genres resolved for {} artists ({} failed batches)",
            enrichment.resolved_artists,
            enrichment.failed_batches.len()
        );
    }

    match &report.snapshot {
        Some(snapshot) => log::info!("Snapshot written: {}", snapshot.path.display()),
        None => log::warn!("No snapshot written"),
    }

    Ok(())
}
