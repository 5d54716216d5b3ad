use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::error::AuthError;
use crate::config::OAuthConfig;

const GOOGLE_SCOPES: &str = "openid profile https://www.googleapis.com/auth/userinfo.email";
const DEFAULT_SCOPES: &str = "openid profile offline_access";

/// Device authorization grant result.
///
/// Some authorization servers return `verification_url` instead of
/// `verification_uri`; this type normalizes to `verification_uri` as the
/// canonical field, which is part of the contract rather than an
/// implementation detail.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    #[serde(alias = "verification_url")]
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Server-advised minimum poll interval, seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
    pub expires_in: u64,
}

fn default_interval() -> u64 {
    5
}

/// Obtain a device code, user code, and verification URI from the
/// authorization server.
pub async fn request_device_authorization(
    client: &Client,
    config: &OAuthConfig,
) -> Result<DeviceAuthorization, AuthError> {
    let scope = oauth_scopes(&config.issuer);
    debug!(
        endpoint = %config.device_authorization_endpoint,
        scope,
        "requesting device authorization"
    );

    let response = client
        .post(&config.device_authorization_endpoint)
        .form(&[("client_id", config.client_id.as_str()), ("scope", scope)])
        .send()
        .await
        .map_err(|e| AuthError::DeviceAuthorizationFailed(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::DeviceAuthorizationFailed(format!(
            "HTTP {status}: {body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))
}

/// Scope string for an issuer, selected by registrable domain.
///
/// Google rejects `offline_access` and requires its own userinfo scope;
/// every other issuer (Okta included) gets the standard set. Providers fail
/// if handed the wrong scopes, so this table is exact.
pub fn oauth_scopes(issuer: &str) -> &'static str {
    match registrable_domain(issuer).as_deref() {
        Some("google.com") => GOOGLE_SCOPES,
        _ => DEFAULT_SCOPES,
    }
}

/// Last two labels of the issuer host, e.g. `accounts.google.com` →
/// `google.com`.
fn registrable_domain(issuer: &str) -> Option<String> {
    let parsed = Url::parse(issuer).ok()?;
    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return Some(host.to_ascii_lowercase());
    }
    Some(labels[labels.len() - 2..].join(".").to_ascii_lowercase())
}
