use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token pair persisted in the token store.
///
/// Tokens are created from a successful token-endpoint response, persisted
/// immediately by the caller, and replaced wholesale on refresh — never
/// mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Build a fresh token from a token-endpoint response.
    pub fn from_token_response(response: &TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at,
        }
    }

    /// A token with no expiry never expires.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

/// Successful token-endpoint response body (device grant or refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Raw token-endpoint body before classification: either token fields or an
/// OAuth error are present.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointBody {
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenEndpointBody {
    pub fn into_token_response(self) -> Option<TokenResponse> {
        self.access_token.map(|access_token| TokenResponse {
            access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
        })
    }
}
