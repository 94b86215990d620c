use crate::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single listening event from the user's recently played history.
///
/// Field order is the column order of snapshot files. `played_at` is kept exactly
/// as the API returned it; use [`PlayEvent::played_at_utc`] for a parsed value.
///
/// # Examples
///
/// ```rust
/// use spotify_history_sync::PlayEvent;
///
/// let event = PlayEvent {
///     played_at: "2024-01-01T10:00:00.000Z".to_string(),
///     track_id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
///     track_name: "Never Gonna Give You Up".to_string(),
///     popularity: 78,
///     duration_ms: 213_573,
///     explicit: false,
///     artist_id: "0gxyHStUsqpMadRV0Di1Qt".to_string(),
///     artist_name: "Rick Astley".to_string(),
///     album_name: "Whenever You Need Somebody".to_string(),
///     album_image: None,
///     release_date: "1987-11-12".to_string(),
///     artist_genre: None,
/// };
///
/// assert_eq!(event.cursor().unwrap(), 1_704_103_200_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// When the track was played (ISO-8601, UTC), as received
    pub played_at: String,
    pub track_id: String,
    pub track_name: String,
    /// Popularity score between 0 and 100
    pub popularity: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    /// Id of the first-listed artist only
    pub artist_id: String,
    /// Name of the first-listed artist only
    pub artist_name: String,
    pub album_name: String,
    /// URL of the first album image, absent when the album has no artwork
    #[serde(default)]
    pub album_image: Option<String>,
    /// Release date with source-dependent precision (year, year-month or full date)
    pub release_date: String,
    /// Populated by the genre enricher
    #[serde(default)]
    pub artist_genre: Option<String>,
}

impl PlayEvent {
    /// Parse `played_at` into a UTC timestamp.
    ///
    /// Accepts RFC 3339 values with or without fractional seconds.
    pub fn played_at_utc(&self) -> Result<DateTime<Utc>> {
        parse_played_at(&self.played_at)
    }

    /// Pagination cursor for the page that follows this event: its play time in
    /// epoch milliseconds.
    pub fn cursor(&self) -> Result<i64> {
        Ok(self.played_at_utc()?.timestamp_millis())
    }
}

/// Parse a `played_at` value as returned by the API.
pub fn parse_played_at(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SyncError::Parse(format!("Invalid played_at timestamp '{value}': {e}")))
}

/// Genre list for one artist, as returned by a batch artist lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistGenres {
    pub id: String,
    pub genres: Vec<String>,
}

#[cfg(test)]
pub(crate) fn sample_event(played_at: &str, track_id: &str, artist_id: &str) -> PlayEvent {
    PlayEvent {
        played_at: played_at.to_string(),
        track_id: track_id.to_string(),
        track_name: format!("Track {track_id}"),
        popularity: 50,
        duration_ms: 180_000,
        explicit: false,
        artist_id: artist_id.to_string(),
        artist_name: format!("Artist {artist_id}"),
        album_name: "Album".to_string(),
        album_image: Some("https://i.scdn.co/image/abc".to_string()),
        release_date: "2020".to_string(),
        artist_genre: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_from_fractional_timestamp() {
        let event = sample_event("2024-01-01T10:00:00.000Z", "t1", "a1");
        assert_eq!(event.cursor().unwrap(), 1_704_103_200_000);
    }

    #[test]
    fn test_cursor_keeps_milliseconds() {
        let event = sample_event("2024-01-01T10:00:00.123456Z", "t1", "a1");
        assert_eq!(event.cursor().unwrap(), 1_704_103_200_123);
    }

    #[test]
    fn test_cursor_without_fraction() {
        let event = sample_event("2024-01-01T10:00:00Z", "t1", "a1");
        assert_eq!(event.cursor().unwrap(), 1_704_103_200_000);
    }

    #[test]
    fn test_malformed_timestamp_is_parse_error() {
        let event = sample_event("yesterday", "t1", "a1");
        assert!(matches!(event.cursor(), Err(SyncError::Parse(_))));
    }
}
