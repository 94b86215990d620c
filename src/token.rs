use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before the real expiry at which a token is already treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Serializable OAuth token that can be persisted and restored.
///
/// This contains everything needed to call the API on the user's behalf without
/// going through the authorization flow again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    /// Used to obtain a new access token once this one expires
    pub refresh_token: Option<String>,
    /// Space separated scopes granted by the user
    #[serde(default)]
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl SpotifyToken {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        scope: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            scope,
            expires_at,
        }
    }

    /// Token that expires `expires_in` seconds from now.
    pub fn expiring_in(
        access_token: String,
        refresh_token: Option<String>,
        scope: String,
        expires_in: i64,
    ) -> Self {
        Self::new(
            access_token,
            refresh_token,
            scope,
            Utc::now() + Duration::seconds(expires_in),
        )
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|granted| granted == scope)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
