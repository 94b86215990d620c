use crate::token::SpotifyToken;
use crate::{Result, SyncError};
use std::fs;
use std::path::{Path, PathBuf};

/// Token persistence for a single cached OAuth token file.
///
/// By default the file lives at `~/.local/share/spotify-history-sync/token.json`
/// (see [`PathsConfig`](crate::config::PathsConfig)).
#[derive(Debug, Clone)]
pub struct TokenPersistence {
    path: PathBuf,
}

impl TokenPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save a token, creating the parent directories as needed.
    pub fn save(&self, token: &SpotifyToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = token
            .to_json()
            .map_err(|e| SyncError::Parse(format!("Failed to serialize token: {e}")))?;
        fs::write(&self.path, json)?;

        log::debug!("Token saved to: {}", self.path.display());
        Ok(())
    }

    /// Load the cached token.
    ///
    /// Returns an [`SyncError::Auth`] when no token has been cached yet.
    pub fn load(&self) -> Result<SpotifyToken> {
        if !self.path.exists() {
            return Err(SyncError::Auth(format!(
                "No cached token at {}; run the `authorize` command first",
                self.path.display()
            )));
        }

        let json = fs::read_to_string(&self.path)?;
        let token = SpotifyToken::from_json(&json)
            .map_err(|e| SyncError::Parse(format!("Failed to parse token file: {e}")))?;

        log::debug!("Token loaded from: {}", self.path.display());
        Ok(token)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            log::debug!("Token removed from: {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = TokenPersistence::new(dir.path().join("nested").join("token.json"));
        assert!(!persistence.exists());

        let token = SpotifyToken::new(
            "access".to_string(),
            Some("refresh".to_string()),
            "user-read-recently-played".to_string(),
            Utc::now(),
        );
        persistence.save(&token).unwrap();
        assert!(persistence.exists());
        assert_eq!(persistence.load().unwrap(), token);

        persistence.remove().unwrap();
        assert!(!persistence.exists());
    }

    #[test]
    fn test_load_missing_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = TokenPersistence::new(dir.path().join("token.json"));
        assert!(matches!(persistence.load(), Err(SyncError::Auth(_))));
    }
}
