#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use glean_auth::auth::{AuthError, ClientMetadata, MetadataStore, Token, TokenStore};
use glean_auth::config::{BasicConfig, GleanConfig, OAuthConfig};

#[derive(Default)]
pub struct InMemoryStore {
    tokens: Mutex<HashMap<String, Token>>,
    metadata: Mutex<HashMap<String, ClientMetadata>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_token(&self, server: &str, token: Token) {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .insert(server.to_string(), token);
    }

    pub fn seed_metadata(&self, server: &str, metadata: ClientMetadata) {
        self.metadata
            .lock()
            .expect("store lock poisoned")
            .insert(server.to_string(), metadata);
    }

    pub fn token(&self, server: &str) -> Option<Token> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .get(server)
            .cloned()
    }

    pub fn client_metadata(&self, server: &str) -> Option<ClientMetadata> {
        self.metadata
            .lock()
            .expect("store lock poisoned")
            .get(server)
            .cloned()
    }
}

impl TokenStore for InMemoryStore {
    fn load(&self, server: &str) -> Result<Option<Token>, AuthError> {
        Ok(self.token(server))
    }

    fn save(&self, server: &str, token: &Token) -> Result<(), AuthError> {
        self.seed_token(server, token.clone());
        Ok(())
    }

    fn clear(&self, server: &str) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .remove(server);
        Ok(())
    }
}

impl MetadataStore for InMemoryStore {
    fn load(&self, server: &str) -> Result<Option<ClientMetadata>, AuthError> {
        Ok(self.client_metadata(server))
    }

    fn save(&self, server: &str, metadata: &ClientMetadata) -> Result<(), AuthError> {
        self.seed_metadata(server, metadata.clone());
        Ok(())
    }

    fn clear(&self, server: &str) -> Result<(), AuthError> {
        self.metadata
            .lock()
            .expect("store lock poisoned")
            .remove(server);
        Ok(())
    }
}

pub fn fresh_token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
    }
}

pub fn expired_token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Some(Utc::now() - Duration::minutes(5)),
    }
}

/// Complete OAuth config whose endpoints all live on a mock server.
pub fn oauth_config(server_uri: &str) -> OAuthConfig {
    OAuthConfig {
        base_url: "https://acme.glean.com".to_string(),
        issuer: "https://acme.okta.com".to_string(),
        client_id: "client-1".to_string(),
        client_secret: None,
        device_authorization_endpoint: format!("{server_uri}/oauth/device"),
        token_endpoint: format!("{server_uri}/oauth/token"),
    }
}

/// Basic config whose base URL points at a mock server, for discovery.
pub fn basic_config(server_uri: &str) -> BasicConfig {
    BasicConfig {
        base_url: server_uri.to_string(),
        issuer: None,
        client_id: None,
        client_secret: None,
    }
}

pub fn oauth_glean_config(server_uri: &str) -> GleanConfig {
    GleanConfig::OAuth(oauth_config(server_uri))
}

/// Device authorization fixture with a short poll interval.
pub fn device_authorization(interval: u64) -> glean_auth::auth::DeviceAuthorization {
    serde_json::from_value(serde_json::json!({
        "device_code": "device-123",
        "user_code": "ABCD-EFGH",
        "verification_uri": "https://acme.okta.com/activate",
        "interval": interval,
        "expires_in": 900
    }))
    .expect("valid fixture")
}
