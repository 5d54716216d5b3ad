//! OAuth metadata discovery.
//!
//! Turns a partial [`BasicConfig`] into a complete [`OAuthConfig`] via two
//! well-known documents: the protected resource metadata on the Glean
//! instance origin, then the authorization server metadata on the issuer
//! (OIDC discovery first, RFC 8414 fallback).

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::error::AuthError;
use crate::config::{BasicConfig, OAuthConfig};

/// Protected resource metadata published on the Glean instance origin.
#[derive(Debug, Deserialize)]
struct ProtectedResourceDoc {
    #[serde(default)]
    authorization_servers: Vec<String>,
    glean_device_flow_client_id: Option<String>,
    #[serde(default)]
    glean_device_flow_client_sec: Option<String>,
}

/// Authorization server metadata, from either well-known location.
#[derive(Debug, Deserialize)]
struct AuthServerDoc {
    token_endpoint: Option<String>,
    device_authorization_endpoint: Option<String>,
}

/// Complete a partial config by discovering the issuer, client id, and
/// endpoints. Side-effect-free beyond the network calls; the caller is
/// responsible for persisting the result.
pub async fn discover(client: &Client, config: &BasicConfig) -> Result<OAuthConfig, AuthError> {
    // Issuer and client id from the environment short-circuit the
    // protected-resource fetch.
    let (issuer, client_id, client_secret) = match (&config.issuer, &config.client_id) {
        (Some(issuer), Some(client_id)) => (
            issuer.clone(),
            client_id.clone(),
            config.client_secret.clone(),
        ),
        _ => fetch_protected_resource(client, &config.base_url).await?,
    };

    let doc = fetch_auth_server_metadata(client, &issuer).await?;
    let token_endpoint = doc.token_endpoint.ok_or(AuthError::MissingTokenEndpoint)?;
    let device_authorization_endpoint = doc
        .device_authorization_endpoint
        .ok_or(AuthError::MissingDeviceAuthorizationEndpoint)?;

    Ok(OAuthConfig {
        base_url: config.base_url.clone(),
        issuer,
        client_id,
        client_secret,
        device_authorization_endpoint,
        token_endpoint,
    })
}

async fn fetch_protected_resource(
    client: &Client,
    base_url: &str,
) -> Result<(String, String, Option<String>), AuthError> {
    let url = format!(
        "{}/.well-known/oauth-protected-resource",
        origin(base_url)?
    );
    debug!(url, "fetching protected resource metadata");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| AuthError::ProtectedResourceFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(AuthError::ProtectedResourceFetch(format!(
            "HTTP {} from {url}",
            response.status()
        )));
    }

    let doc: ProtectedResourceDoc = response
        .json()
        .await
        .map_err(|e| AuthError::ProtectedResourceParse(e.to_string()))?;

    let issuer = doc
        .authorization_servers
        .first()
        .cloned()
        .ok_or(AuthError::MissingAuthorizationServers)?;
    let client_id = doc
        .glean_device_flow_client_id
        .ok_or(AuthError::MissingDeviceClientId)?;

    debug!(issuer, "discovered authorization server");
    Ok((issuer, client_id, doc.glean_device_flow_client_sec))
}

async fn fetch_auth_server_metadata(
    client: &Client,
    issuer: &str,
) -> Result<AuthServerDoc, AuthError> {
    let issuer = issuer.trim_end_matches('/');
    let openid_url = format!("{issuer}/.well-known/openid-configuration");

    match fetch_metadata_doc(client, &openid_url).await {
        Ok(doc) => Ok(doc),
        Err(err @ AuthError::AuthServerMetadataParse(_)) => Err(err),
        Err(err) => {
            debug!(error = %err, "OIDC discovery failed, trying oauth-authorization-server");
            let fallback_url = format!("{issuer}/.well-known/oauth-authorization-server");
            fetch_metadata_doc(client, &fallback_url).await
        }
    }
}

async fn fetch_metadata_doc(client: &Client, url: &str) -> Result<AuthServerDoc, AuthError> {
    debug!(url, "fetching authorization server metadata");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AuthError::AuthServerMetadataFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(AuthError::AuthServerMetadataFetch(format!(
            "HTTP {} from {url}",
            response.status()
        )));
    }
    response
        .json()
        .await
        .map_err(|e| AuthError::AuthServerMetadataParse(e.to_string()))
}

/// Scheme + host + port of a URL, with no trailing slash.
pub(crate) fn origin(url: &str) -> Result<String, AuthError> {
    let parsed = Url::parse(url)
        .map_err(|e| AuthError::Configuration(format!("invalid base URL {url}: {e}")))?;
    let origin = parsed.origin();
    if !matches!(origin, url::Origin::Tuple(..)) {
        return Err(AuthError::Configuration(format!(
            "base URL {url} has no origin"
        )));
    }
    Ok(origin.ascii_serialization())
}
