use crate::{ArtistGenres, PlayEvent, Result};
use async_trait::async_trait;

/// Trait for the Spotify Web API operations the pipeline consumes.
///
/// The extractor and enricher only see this trait, so tests can substitute a
/// fake or a mock for the HTTP-backed [`SpotifyApiClient`](crate::SpotifyApiClient).
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockSpotifyApi`
/// that implements this trait using the `mockall` library.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait(?Send)]
pub trait SpotifyApi {
    /// Fetch one page of the user's recently played tracks, newest first.
    ///
    /// `before` is an exclusive upper bound in epoch milliseconds; `None` asks for
    /// the most recent plays.
    async fn fetch_recently_played(&self, limit: u32, before: Option<i64>)
        -> Result<Vec<PlayEvent>>;

    /// Look up genre lists for up to 50 artists in one request.
    ///
    /// Ids the API does not know are omitted from the result.
    async fn fetch_artists(&self, ids: &[String]) -> Result<Vec<ArtistGenres>>;
}
