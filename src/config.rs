//! Process configuration.
//!
//! Configuration is read once from the environment at process start and handed to
//! the components that need it. Each section is validated on its own so that a run
//! only requires the credentials it actually uses.

use crate::{Result, SyncError};
use std::path::PathBuf;

/// Port of the destination MySQL server.
pub const MYSQL_PORT: u16 = 3306;

/// Default directory for snapshot files.
pub const DEFAULT_SNAPSHOT_DIR: &str = "data";

/// Default persisted log file.
pub const DEFAULT_LOG_FILE: &str = "pipeline.log";

/// Credentials for the Spotify Web API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered for the app; only the `authorize` flow needs it.
    pub redirect_uri: Option<String>,
}

impl SpotifyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            client_id: required(&lookup, "SPOTIPY_CLIENT_ID")?,
            client_secret: required(&lookup, "SPOTIPY_CLIENT_SECRET")?,
            redirect_uri: optional(&lookup, "SPOTIPY_REDIRECT_URI"),
        })
    }

    /// The redirect URI, or a configuration error when it is not set.
    pub fn require_redirect_uri(&self) -> Result<&str> {
        self.redirect_uri.as_deref().ok_or_else(|| {
            SyncError::Config("SPOTIPY_REDIRECT_URI environment variable not set".to_string())
        })
    }
}

/// Connection parameters for the destination MySQL database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub port: u16,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("port", &self.port)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: required(&lookup, "DB_HOST")?,
            user: required(&lookup, "DB_USER")?,
            password: required(&lookup, "DB_PASSWORD")?,
            name: required(&lookup, "DB_NAME")?,
            port: MYSQL_PORT,
        })
    }
}

/// Filesystem locations used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Directory holding `spotify_enriched_*.csv` snapshots
    pub snapshot_dir: PathBuf,
    /// File every log line is appended to
    pub log_file: PathBuf,
    /// Cached OAuth token
    pub token_cache: PathBuf,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let snapshot_dir = optional(&lookup, "SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR));
        let log_file = optional(&lookup, "PIPELINE_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let token_cache = optional(&lookup, "SPOTIFY_TOKEN_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_cache);

        Self {
            snapshot_dir,
            log_file,
            token_cache,
        }
    }
}

/// `~/.local/share/spotify-history-sync/token.json`, or a dotfile in the working
/// directory when no XDG data directory is available.
fn default_token_cache() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("spotify-history-sync").join("token.json"),
        None => PathBuf::from(".spotify-history-sync-token.json"),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key)
        .ok_or_else(|| SyncError::Config(format!("{key} environment variable not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_config_complete() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_USER", "etl"),
            ("DB_PASSWORD", "p@ss:word"),
            ("DB_NAME", "music"),
        ]))
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert!(!format!("{config:?}").contains("p@ss:word"));
    }

    #[test]
    fn test_missing_password_names_variable() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_USER", "etl"),
            ("DB_NAME", "music"),
        ]))
        .unwrap_err();

        match err {
            SyncError::Config(msg) => assert!(msg.contains("DB_PASSWORD")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_client_id_is_missing() {
        let err = SpotifyConfig::from_lookup(lookup_from(&[
            ("SPOTIPY_CLIENT_ID", "  "),
            ("SPOTIPY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::Config(msg) if msg.contains("SPOTIPY_CLIENT_ID")));
    }

    #[test]
    fn test_redirect_uri_only_required_on_demand() {
        let config = SpotifyConfig::from_lookup(lookup_from(&[
            ("SPOTIPY_CLIENT_ID", "id"),
            ("SPOTIPY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();
        assert!(config.require_redirect_uri().is_err());
    }

    #[test]
    fn test_path_defaults_and_overrides() {
        let defaults = PathsConfig::from_lookup(lookup_from(&[]));
        assert_eq!(defaults.snapshot_dir, PathBuf::from("data"));
        assert_eq!(defaults.log_file, PathBuf::from("pipeline.log"));
        assert!(defaults.token_cache.ends_with("token.json")
            || defaults.token_cache.ends_with(".spotify-history-sync-token.json"));

        let custom = PathsConfig::from_lookup(lookup_from(&[
            ("SNAPSHOT_DIR", "/tmp/snaps"),
            ("SPOTIFY_TOKEN_CACHE", "/tmp/token.json"),
        ]));
        assert_eq!(custom.snapshot_dir, PathBuf::from("/tmp/snaps"));
        assert_eq!(custom.token_cache, PathBuf::from("/tmp/token.json"));
    }
}
