pub mod authorize;
pub mod extract;
pub mod load;

use clap::Subcommand;
use spotify_history_sync::config::PathsConfig;
use spotify_history_sync::pipeline::DEFAULT_EXTRACT_LIMIT;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract recently played tracks, enrich them with genres and write a snapshot
    ///
    /// Usage examples:
    /// # Snapshot the last 150 plays
    /// spotify-history-sync extract
    ///
    /// # Snapshot the last 40 plays
    /// spotify-history-sync extract --limit 40
    Extract {
        /// Maximum number of plays to extract
        #[arg(
            long,
            default_value_t = DEFAULT_EXTRACT_LIMIT as u64,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        limit: u64,
    },

    /// Replace the play_history table with the newest snapshot
    ///
    /// Usage examples:
    /// # Load into MySQL using DB_HOST, DB_USER, DB_PASSWORD and DB_NAME
    /// spotify-history-sync load
    ///
    /// # Parse the newest snapshot without touching the database
    /// spotify-history-sync load --dry-run
    Load {
        /// Build the table in memory instead of writing to MySQL
        #[arg(long)]
        dry_run: bool,
    },

    /// Authorize access to your listening history and cache the token
    Authorize,
}

pub async fn execute_command(
    command: Commands,
    paths: &PathsConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Extract { limit } => {
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            extract::handle_extract_command(paths, limit).await
        },
        Commands::Load { dry_run } => load::handle_load_command(paths, dry_run).await,
        Commands::Authorize => authorize::handle_authorize_command(paths).await,
    }
}
