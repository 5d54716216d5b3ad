//! Polling engine for the device grant.
//!
//! The only retry loop in the crate: each tick exchanges the device code at
//! the token endpoint and classifies the body. `authorization_pending` keeps
//! polling at the server-advised interval, `slow_down` grows the interval,
//! anything else is terminal. A hard 10-minute deadline applies from the
//! first tick regardless of how many ticks occurred.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::device_code::DeviceAuthorization;
use super::error::AuthError;
use super::token::{TokenEndpointBody, TokenResponse};
use crate::config::OAuthConfig;

/// Hard wall-clock deadline from the first tick.
pub const POLL_DEADLINE: Duration = Duration::from_secs(600);

const SLOW_DOWN_BACKOFF_SECS: u64 = 5;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Classified outcome of one token-endpoint tick.
#[derive(Debug)]
enum PollTick {
    Pending,
    SlowDown,
    Token(TokenResponse),
}

/// Poll the token endpoint until the user authorizes, the server rejects, or
/// [`POLL_DEADLINE`] passes.
pub async fn poll_for_token(
    client: &Client,
    config: &OAuthConfig,
    authorization: &DeviceAuthorization,
) -> Result<TokenResponse, AuthError> {
    poll_with_deadline(client, config, authorization, POLL_DEADLINE).await
}

/// Deadline-parameterized variant of [`poll_for_token`].
pub async fn poll_with_deadline(
    client: &Client,
    config: &OAuthConfig,
    authorization: &DeviceAuthorization,
    deadline: Duration,
) -> Result<TokenResponse, AuthError> {
    let mut interval = Duration::from_secs(authorization.interval.max(1));

    let ticks = async {
        loop {
            match poll_once(client, config, &authorization.device_code).await? {
                PollTick::Token(response) => return Ok(response),
                PollTick::Pending => {}
                PollTick::SlowDown => {
                    interval += Duration::from_secs(SLOW_DOWN_BACKOFF_SECS);
                }
            }
            debug!(interval_secs = interval.as_secs(), "authorization pending");
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(deadline, ticks)
        .await
        .map_err(|_| AuthError::AuthorizationTimeout)?
}

async fn poll_once(
    client: &Client,
    config: &OAuthConfig,
    device_code: &str,
) -> Result<PollTick, AuthError> {
    let mut form = vec![
        ("client_id", config.client_id.as_str()),
        ("grant_type", DEVICE_CODE_GRANT),
        ("device_code", device_code),
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

    let body: TokenEndpointBody = serde_json::from_slice(&bytes).map_err(|e| {
        AuthError::UnexpectedResponse(format!("token endpoint returned HTTP {status}: {e}"))
    })?;

    if let Some(error) = body.error {
        return match error.as_str() {
            "authorization_pending" => Ok(PollTick::Pending),
            "slow_down" => Ok(PollTick::SlowDown),
            _ => Err(AuthError::AuthorizationDenied {
                error,
                description: body.error_description,
            }),
        };
    }

    match body.into_token_response() {
        Some(token) => Ok(PollTick::Token(token)),
        None => Err(AuthError::UnexpectedResponse(
            "token endpoint returned neither a token nor an error".to_string(),
        )),
    }
}
