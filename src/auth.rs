//! Spotify authorization-code flow and token refresh.

use crate::api::read_success_body;
use crate::config::SpotifyConfig;
use crate::token::SpotifyToken;
use crate::token_persistence::TokenPersistence;
use crate::{Result, SyncError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::Deserialize;

pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Scope needed to read the recently played history.
pub const RECENTLY_PLAYED_SCOPE: &str = "user-read-recently-played";

/// Obtains and refreshes user tokens from the Spotify accounts service.
pub struct SpotifyAuth {
    client: Box<dyn HttpClient>,
    config: SpotifyConfig,
    accounts_url: String,
}

#[derive(Deserialize)]
struct ApiTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: String,
    expires_in: i64,
}

impl SpotifyAuth {
    pub fn new(client: Box<dyn HttpClient>, config: SpotifyConfig) -> Self {
        Self::with_accounts_url(client, config, SPOTIFY_ACCOUNTS_URL.to_string())
    }

    pub fn with_accounts_url(
        client: Box<dyn HttpClient>,
        config: SpotifyConfig,
        accounts_url: String,
    ) -> Self {
        Self {
            client,
            config,
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL the user opens in a browser to grant access.
    pub fn authorize_url(&self) -> Result<String> {
        let redirect_uri = self.config.require_redirect_uri()?;
        Ok(format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.accounts_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(RECENTLY_PLAYED_SCOPE),
        ))
    }

    /// Exchange the authorization code from the redirect for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<SpotifyToken> {
        let redirect_uri = self.config.require_redirect_uri()?;
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Obtain a new access token from a refresh token.
    ///
    /// Spotify may omit the refresh token from the response, in which case the
    /// one passed in stays valid and is carried over.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SpotifyToken> {
        let mut token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<SpotifyToken> {
        let url = format!("{}/api/token", self.accounts_url);
        let url = url
            .parse::<Url>()
            .map_err(|e| SyncError::Http(format!("Invalid URL '{url}': {e}")))?;

        let credentials = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let form_string = encode_form(form);

        let mut request = Request::new(Method::Post, url);
        request.insert_header("Authorization", format!("Basic {credentials}"));
        request.insert_header("Content-Type", "application/x-www-form-urlencoded");
        request.set_body(form_string);

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        let body = read_success_body(&mut response).await.map_err(|e| match e {
            SyncError::Api { status, message } => {
                SyncError::Auth(format!("Token request rejected ({status}): {message}"))
            }
            other => other,
        })?;

        parse_token_response(&body)
    }
}

pub fn parse_token_response(json: &str) -> Result<SpotifyToken> {
    let response: ApiTokenResponse =
        serde_json::from_str(json).map_err(|e| SyncError::Parse(e.to_string()))?;

    Ok(SpotifyToken::expiring_in(
        response.access_token,
        response.refresh_token,
        response.scope,
        response.expires_in,
    ))
}

/// Extract the authorization code from the URL the browser was redirected to.
pub fn code_from_redirect(redirect_url: &str) -> Result<String> {
    let url = redirect_url
        .trim()
        .parse::<Url>()
        .map_err(|e| SyncError::Parse(format!("Invalid redirect URL: {e}")))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(SyncError::Auth(format!("Authorization denied: {value}")));
            }
            _ => {}
        }
    }

    code.ok_or_else(|| SyncError::Parse("Redirect URL has no `code` parameter".to_string()))
}

/// Load the cached token, refreshing and re-saving it when it has expired.
pub async fn ensure_fresh_token(
    auth: &SpotifyAuth,
    persistence: &TokenPersistence,
) -> Result<SpotifyToken> {
    let token = persistence.load()?;
    if !token.has_scope(RECENTLY_PLAYED_SCOPE) {
        log::warn!("Cached token lacks the {RECENTLY_PLAYED_SCOPE} scope");
    }
    if !token.is_expired() {
        return Ok(token);
    }

    let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
        SyncError::Auth("Cached token expired and has no refresh token".to_string())
    })?;

    log::info!("Access token expired, refreshing...");
    let fresh = auth.refresh(refresh_token).await?;
    persistence.save(&fresh)?;
    Ok(fresh)
}

fn encode_form(form: &[(&str, &str)]) -> String {
    form.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
