use crate::r#trait::SpotifyApi;
use crate::{ArtistGenres, PlayEvent, Result, SyncError};
use async_trait::async_trait;
use http_client::{HttpClient, Request, Response};
use http_types::{Method, Url};
use serde::Deserialize;

/// Base URL of the Spotify Web API.
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";

// =============================================================================
// SpotifyApiClient
// =============================================================================

/// HTTP implementation of [`SpotifyApi`].
///
/// The client does no retrying and sets no timeouts of its own; whatever the
/// injected [`HttpClient`] does is what you get.
///
/// # Examples
///
/// ```rust,no_run
/// use spotify_history_sync::{SpotifyApi, SpotifyApiClient};
///
/// # async fn run() -> spotify_history_sync::Result<()> {
/// let http_client = http_client::native::NativeClient::new();
/// let api = SpotifyApiClient::new(Box::new(http_client), "access-token".to_string());
///
/// let page = api.fetch_recently_played(50, None).await?;
/// println!("{} plays on the first page", page.len());
/// # Ok(())
/// # }
/// ```
pub struct SpotifyApiClient {
    client: Box<dyn HttpClient>,
    access_token: String,
    base_url: String,
}

impl SpotifyApiClient {
    pub fn new(client: Box<dyn HttpClient>, access_token: String) -> Self {
        Self::with_base_url(client, access_token, SPOTIFY_API_BASE_URL.to_string())
    }

    /// Create a client that talks to a different API host, e.g. a local stub.
    pub fn with_base_url(client: Box<dyn HttpClient>, access_token: String, base_url: String) -> Self {
        Self {
            client,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticated GET returning the response body of a successful call.
    async fn get(&self, url: &str) -> Result<String> {
        let url = url
            .parse::<Url>()
            .map_err(|e| SyncError::Http(format!("Invalid URL '{url}': {e}")))?;

        let mut request = Request::new(Method::Get, url);
        request.insert_header("Authorization", format!("Bearer {}", self.access_token));
        request.insert_header("Accept", "application/json");

        log::debug!("GET {}", request.url());
        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        read_success_body(&mut response).await
    }
}

#[async_trait(?Send)]
impl SpotifyApi for SpotifyApiClient {
    async fn fetch_recently_played(
        &self,
        limit: u32,
        before: Option<i64>,
    ) -> Result<Vec<PlayEvent>> {
        let url = recently_played_url(&self.base_url, limit, before);
        let body = self.get(&url).await?;
        parse_recently_played_response(&body)
    }

    async fn fetch_artists(&self, ids: &[String]) -> Result<Vec<ArtistGenres>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = artists_url(&self.base_url, ids);
        let body = self.get(&url).await?;
        parse_artists_response(&body)
    }
}

pub fn recently_played_url(base_url: &str, limit: u32, before: Option<i64>) -> String {
    match before {
        Some(cursor) => format!("{base_url}/me/player/recently-played?limit={limit}&before={cursor}"),
        None => format!("{base_url}/me/player/recently-played?limit={limit}"),
    }
}

pub fn artists_url(base_url: &str, ids: &[String]) -> String {
    format!("{base_url}/artists?ids={}", urlencoding::encode(&ids.join(",")))
}

/// Read the body of a response, turning non-success statuses into errors.
pub(crate) async fn read_success_body(response: &mut Response) -> Result<String> {
    let status: u16 = response.status().into();
    let body = response
        .body_string()
        .await
        .map_err(|e| SyncError::Http(e.to_string()))?;

    if response.status().is_success() {
        return Ok(body);
    }

    if status == 429 {
        let retry_after = response
            .header("Retry-After")
            .and_then(|values| values.last().as_str().trim().parse::<u64>().ok())
            .unwrap_or(0);
        log::warn!("Rate limited by Spotify (retry after {retry_after}s)");
        return Err(SyncError::RateLimit { retry_after });
    }

    Err(SyncError::Api {
        status,
        message: error_message(&body)
            .unwrap_or_else(|| response.status().canonical_reason().to_string()),
    })
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize)]
pub struct ApiRecentlyPlayedResponse {
    pub items: Vec<ApiPlayHistoryItem>,
}

#[derive(Deserialize)]
pub struct ApiPlayHistoryItem {
    pub track: ApiTrack,
    pub played_at: String,
}

#[derive(Deserialize)]
pub struct ApiTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    pub artists: Vec<ApiSimpleArtist>,
    pub album: ApiAlbum,
}

#[derive(Deserialize)]
pub struct ApiSimpleArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ApiAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<ApiImage>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Deserialize)]
pub struct ApiImage {
    pub url: String,
}

#[derive(Deserialize)]
pub struct ApiArtistsResponse {
    /// Unknown ids come back as `null`
    pub artists: Vec<Option<ApiArtist>>,
}

#[derive(Deserialize)]
pub struct ApiArtist {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl TryFrom<ApiPlayHistoryItem> for PlayEvent {
    type Error = SyncError;

    fn try_from(item: ApiPlayHistoryItem) -> Result<Self> {
        let ApiPlayHistoryItem { track, played_at } = item;
        let artist = track.artists.into_iter().next().ok_or_else(|| {
            SyncError::Parse(format!("Track '{}' played at {played_at} has no artists", track.name))
        })?;

        Ok(PlayEvent {
            played_at,
            track_id: track.id.unwrap_or_default(),
            track_name: track.name,
            popularity: track.popularity,
            duration_ms: track.duration_ms,
            explicit: track.explicit,
            artist_id: artist.id.unwrap_or_default(),
            artist_name: artist.name,
            album_name: track.album.name,
            album_image: track.album.images.into_iter().next().map(|image| image.url),
            release_date: track.album.release_date.unwrap_or_default(),
            artist_genre: None,
        })
    }
}

pub fn parse_recently_played_response(json: &str) -> Result<Vec<PlayEvent>> {
    let response: ApiRecentlyPlayedResponse =
        serde_json::from_str(json).map_err(|e| SyncError::Parse(e.to_string()))?;

    response.items.into_iter().map(PlayEvent::try_from).collect()
}

pub fn parse_artists_response(json: &str) -> Result<Vec<ArtistGenres>> {
    let response: ApiArtistsResponse =
        serde_json::from_str(json).map_err(|e| SyncError::Parse(e.to_string()))?;

    Ok(response
        .artists
        .into_iter()
        .flatten()
        .map(|artist| ArtistGenres {
            id: artist.id,
            genres: artist.genres,
        })
        .collect())
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}
