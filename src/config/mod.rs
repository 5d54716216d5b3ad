//! Configuration resolution (env > cached client metadata).

use std::env;

use crate::auth::error::AuthError;
use crate::auth::store::MetadataStore;

/// Resolved configuration for a Glean server.
///
/// Classification is structural and happens exactly once, at resolution
/// time: an API token makes the config terminal, a complete set of OAuth
/// endpoints makes it ready to drive the device flow, anything else needs
/// discovery first.
#[derive(Debug, Clone)]
pub enum GleanConfig {
    /// Terminal variant; no OAuth needed.
    Token(TokenConfig),
    /// Complete OAuth configuration, ready to drive the flow.
    OAuth(OAuthConfig),
    /// Partial configuration; must be discovered before use.
    Basic(BasicConfig),
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub base_url: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub base_url: String,
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub device_authorization_endpoint: String,
    pub token_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct BasicConfig {
    pub base_url: String,
    pub issuer: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Raw configuration inputs before classification.
#[derive(Debug, Clone, Default)]
pub struct ConfigParts {
    pub base_url: String,
    pub api_token: Option<String>,
    pub issuer: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl GleanConfig {
    /// Classify raw inputs into exactly one config variant.
    pub fn classify(parts: ConfigParts) -> Self {
        if let Some(api_token) = parts.api_token {
            return Self::Token(TokenConfig {
                base_url: parts.base_url,
                api_token,
            });
        }
        Self::Basic(BasicConfig {
            base_url: parts.base_url,
            issuer: parts.issuer,
            client_id: parts.client_id,
            client_secret: parts.client_secret,
        })
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    pub fn base_url(&self) -> &str {
        match self {
            Self::Token(c) => &c.base_url,
            Self::OAuth(c) => &c.base_url,
            Self::Basic(c) => &c.base_url,
        }
    }
}

/// Resolve configuration from the environment, falling back to cached OAuth
/// client metadata for the issuer and client id.
///
/// Recognized variables: `GLEAN_BASE_URL` (required), `GLEAN_API_TOKEN`,
/// `GLEAN_OAUTH_ISSUER`, `GLEAN_OAUTH_CLIENT_ID`,
/// `GLEAN_OAUTH_CLIENT_SECRET`.
pub fn get_config(metadata: &dyn MetadataStore) -> Result<GleanConfig, AuthError> {
    let _ = dotenvy::dotenv();

    let base_url = env::var("GLEAN_BASE_URL").map_err(|_| {
        AuthError::Configuration("GLEAN_BASE_URL is not set".to_string())
    })?;

    let mut parts = ConfigParts {
        base_url,
        api_token: non_empty_env("GLEAN_API_TOKEN"),
        issuer: non_empty_env("GLEAN_OAUTH_ISSUER"),
        client_id: non_empty_env("GLEAN_OAUTH_CLIENT_ID"),
        client_secret: env::var("GLEAN_OAUTH_CLIENT_SECRET").ok(),
    };

    if parts.api_token.is_none() && (parts.issuer.is_none() || parts.client_id.is_none()) {
        let server = crate::auth::service::server_key(&parts.base_url);
        if let Some(cached) = metadata.load(&server)? {
            parts.client_id.get_or_insert(cached.client_id);
            if parts.client_secret.is_none() {
                parts.client_secret = cached.client_secret;
            }
        }
    }

    Ok(GleanConfig::classify(parts))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
