mod commands;

use clap::Parser;
use commands::{execute_command, Commands};
use spotify_history_sync::config::PathsConfig;
use spotify_history_sync::logging;

/// Spotify listening history sync
#[derive(Parser)]
#[command(
    name = "spotify-history-sync",
    about = "Snapshot Spotify listening history and load it into MySQL",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let paths = PathsConfig::from_env();

    let level = if args.verbose { "debug" } else { "info" };
    if let Err(e) = logging::init(&paths.log_file, level) {
        eprintln!("❌ Failed to open log file {}: {e}", paths.log_file.display());
        std::process::exit(1);
    }

    if let Err(e) = execute_command(args.command, &paths).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
