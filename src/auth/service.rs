use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::device_code;
use super::discovery;
use super::error::AuthError;
use super::interop;
use super::poll;
use super::prompt;
use super::refresh;
use super::store::{normalize_label, ClientMetadata, MetadataStore, TokenStore};
use super::token::Token;
use crate::config::{GleanConfig, OAuthConfig};

/// Orchestrator for the credential lifecycle.
///
/// Owns a single in-flight authorization attempt at a time: the polling
/// engine is the authoritative result, the interactive prompt is a sibling
/// cancelled when polling settles. All printing and exit codes belong to the
/// caller; the service only returns typed results and errors.
pub struct AuthService {
    http: Client,
    tokens: Arc<dyn TokenStore>,
    metadata: Arc<dyn MetadataStore>,
    /// In-process single-flight gate for refresh. Cross-process callers
    /// remain last-writer-wins; the store has no file locking.
    refresh_gate: tokio::sync::Mutex<()>,
    interactive: bool,
}

impl AuthService {
    pub fn new(tokens: Arc<dyn TokenStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            http: Client::new(),
            tokens,
            metadata,
            refresh_gate: tokio::sync::Mutex::new(()),
            interactive: true,
        }
    }

    /// Skip the terminal prompt and browser open; poll only. For headless
    /// callers that display the user code through their own surface.
    pub fn headless(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Make sure a usable credential is present.
    ///
    /// Token configs succeed trivially with no network call. Otherwise:
    /// load stored tokens, authorize from scratch when absent, refresh when
    /// expired, then report whether a non-expired token is now stored. Does
    /// not validate the token against the resource server.
    pub async fn ensure_token_presence(&self, config: &GleanConfig) -> Result<bool, AuthError> {
        if config.is_token() {
            return Ok(true);
        }
        let server = server_key(config.base_url());
        match self.tokens.load(&server)? {
            None => {
                debug!(server, "no stored tokens, starting authorization");
                let oauth = self.complete_config(config).await?;
                self.authorize(&oauth).await?;
            }
            Some(token) if token.is_expired() => {
                debug!(server, "stored token expired, refreshing");
                let oauth = self.complete_config(config).await?;
                self.refresh_if_still_expired(&oauth, &server).await?;
            }
            Some(_) => {}
        }
        Ok(self
            .tokens
            .load(&server)?
            .is_some_and(|token| !token.is_expired()))
    }

    /// Run the device flow unconditionally and persist the result.
    pub async fn force_authorize(&self, config: &GleanConfig) -> Result<Token, AuthError> {
        if config.is_token() {
            return Err(AuthError::TokenConfigOnly);
        }
        let oauth = self.complete_config(config).await?;
        self.authorize(&oauth).await
    }

    /// Refresh the stored tokens unconditionally and persist the result.
    pub async fn force_refresh_tokens(&self, config: &GleanConfig) -> Result<Token, AuthError> {
        if config.is_token() {
            return Err(AuthError::TokenConfigOnly);
        }
        let server = server_key(config.base_url());
        let stored = self.tokens.load(&server)?.ok_or(AuthError::NoStoredTokens)?;
        if stored.refresh_token.is_none() {
            return Err(AuthError::NoRefreshToken);
        }
        let oauth = self.complete_config(config).await?;

        let _gate = self.refresh_gate.lock().await;
        let current = self.tokens.load(&server)?.ok_or(AuthError::NoStoredTokens)?;
        let fresh = refresh::refresh(&self.http, &oauth, &current).await?;
        self.tokens.save(&server, &fresh)?;
        Ok(fresh)
    }

    /// Complete an incomplete config via discovery and persist the client
    /// metadata. Idempotent: token configs and already-complete OAuth
    /// configs pass through unchanged.
    pub async fn upgrade_config_to_oauth(
        &self,
        config: GleanConfig,
    ) -> Result<GleanConfig, AuthError> {
        let basic = match config {
            GleanConfig::Token(_) | GleanConfig::OAuth(_) => return Ok(config),
            GleanConfig::Basic(basic) => basic,
        };
        let oauth = discovery::discover(&self.http, &basic).await?;
        let metadata = ClientMetadata {
            client_id: oauth.client_id.clone(),
            client_secret: oauth.client_secret.clone(),
        };
        self.metadata.save(&server_key(&oauth.base_url), &metadata)?;
        Ok(GleanConfig::OAuth(oauth))
    }

    /// Stored token for the configured server, if any.
    pub fn status(&self, config: &GleanConfig) -> Result<Option<Token>, AuthError> {
        self.tokens.load(&server_key(config.base_url()))
    }

    /// Remove stored tokens and cached client metadata for the server.
    pub fn logout(&self, config: &GleanConfig) -> Result<(), AuthError> {
        let server = server_key(config.base_url());
        self.tokens.clear(&server)?;
        self.metadata.clear(&server)
    }

    /// Mirror the stored credential into the companion proxy tool's cache.
    pub fn write_proxy_mirror(
        &self,
        config: &GleanConfig,
        dir: Option<&Path>,
    ) -> Result<(), AuthError> {
        let server = server_key(config.base_url());
        let metadata = self
            .metadata
            .load(&server)?
            .ok_or(AuthError::MissingClientMetadata)?;
        let token = self.tokens.load(&server)?.ok_or(AuthError::NoStoredTokens)?;
        let dir = dir
            .map(Path::to_path_buf)
            .unwrap_or_else(interop::default_mirror_dir);
        interop::write_mirror(&dir, config.base_url(), &metadata, &token)
    }

    /// Device grant, racing the interactive prompt against the polling
    /// engine. Polling is the authoritative outcome; the prompt observes
    /// cancellation once polling settles and must not open the browser
    /// after that.
    async fn authorize(&self, oauth: &OAuthConfig) -> Result<Token, AuthError> {
        if self.interactive {
            prompt::ensure_interactive()?;
        }
        let authorization = device_code::request_device_authorization(&self.http, oauth).await?;

        let cancel = CancellationToken::new();
        let prompt_task = self.interactive.then(|| {
            tokio::spawn(prompt::prompt_and_open(
                authorization.clone(),
                cancel.child_token(),
            ))
        });

        let outcome = poll::poll_for_token(&self.http, oauth, &authorization).await;

        cancel.cancel();
        if let Some(task) = prompt_task {
            if let Err(err) = task.await {
                warn!(error = %err, "prompt task ended abnormally");
            }
        }

        let token = Token::from_token_response(&outcome?);
        self.tokens.save(&server_key(&oauth.base_url), &token)?;
        Ok(token)
    }

    async fn complete_config(&self, config: &GleanConfig) -> Result<OAuthConfig, AuthError> {
        match config {
            GleanConfig::Token(_) => Err(AuthError::TokenConfigOnly),
            GleanConfig::OAuth(oauth) => Ok(oauth.clone()),
            GleanConfig::Basic(basic) => discovery::discover(&self.http, basic).await,
        }
    }

    /// Single-flight refresh: concurrent in-process callers serialize on
    /// the gate and the loser reuses the winner's result.
    async fn refresh_if_still_expired(
        &self,
        oauth: &OAuthConfig,
        server: &str,
    ) -> Result<Token, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.tokens.load(server)?.ok_or(AuthError::NoStoredTokens)?;
        if !current.is_expired() {
            return Ok(current);
        }
        let fresh = refresh::refresh(&self.http, oauth, &current).await?;
        self.tokens.save(server, &fresh)?;
        Ok(fresh)
    }
}

/// Stable store key for a server identity: the base URL host, normalized.
pub fn server_key(base_url: &str) -> String {
    let host = Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));
    match host {
        Some(host) => normalize_label(&host),
        None => normalize_label(base_url),
    }
}
