use reqwest::Client;
use tracing::debug;

use super::error::AuthError;
use super::token::{Token, TokenEndpointBody};
use crate::config::OAuthConfig;

/// Exchange a stored refresh token for a new token pair.
///
/// The old tokens are discarded wholesale; nothing is merged. Rejects before
/// any network call when the record has no refresh token.
pub async fn refresh(
    client: &Client,
    config: &OAuthConfig,
    token: &Token,
) -> Result<Token, AuthError> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or(AuthError::NoRefreshToken)?;

    debug!(endpoint = %config.token_endpoint, "refreshing access token");

    let mut form = vec![
        ("client_id", config.client_id.as_str()),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];
    if let Some(secret) = config.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = client
        .post(&config.token_endpoint)
        .form(&form)
        .send()
        .await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    let body: TokenEndpointBody = serde_json::from_slice(&bytes).map_err(|_| {
        AuthError::RefreshRejected(format!(
            "HTTP {status}: {}",
            String::from_utf8_lossy(&bytes)
        ))
    })?;

    // Server-provided error strings surface verbatim.
    if let Some(error) = body.error {
        let detail = match body.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(AuthError::RefreshRejected(detail));
    }

    match body.into_token_response() {
        Some(token_response) => Ok(Token::from_token_response(&token_response)),
        None => Err(AuthError::RefreshRejected(
            "token endpoint returned neither a token nor an error".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_refresh_token_rejects_without_network() {
        // Endpoint is unroutable; the error must come from the local check.
        let config = OAuthConfig {
            base_url: "https://acme.glean.com".to_string(),
            issuer: "https://acme.okta.com".to_string(),
            client_id: "client-1".to_string(),
            client_secret: None,
            device_authorization_endpoint: "http://0.0.0.0:1/device".to_string(),
            token_endpoint: "http://0.0.0.0:1/token".to_string(),
        };
        let token = Token {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        let result = refresh(&Client::new(), &config, &token).await;
        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }
}
