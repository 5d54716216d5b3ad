mod auth_support;

use chrono::Utc;
use glean_auth::auth::refresh::refresh;
use glean_auth::auth::{AuthError, Token};
use pretty_assertions::assert_eq;
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{expired_token, oauth_config};

#[tokio::test]
async fn successful_refresh_replaces_the_token_wholesale() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = oauth_config(&server.uri());
    let before = Utc::now();
    let refreshed = refresh(&Client::new(), &config, &expired_token("access-1"))
        .await
        .expect("refreshed");

    assert_eq!(refreshed.access_token, "access-2");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-2"));
    let expires_at = refreshed.expires_at.expect("expiry");
    assert!(expires_at > before + chrono::Duration::minutes(50));
    assert!(!refreshed.is_expired());
    server.verify().await;
}

#[tokio::test]
async fn refresh_without_rotation_drops_the_old_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let config = oauth_config(&server.uri());
    let refreshed = refresh(&Client::new(), &config, &expired_token("access-1"))
        .await
        .expect("refreshed");

    // The response is taken as-is; the previous refresh token is not kept.
    assert!(refreshed.refresh_token.is_none());
}

#[tokio::test]
async fn server_error_surfaces_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "refresh token is revoked"
        })))
        .mount(&server)
        .await;

    let config = oauth_config(&server.uri());
    let result = refresh(&Client::new(), &config, &expired_token("access-1")).await;
    match result {
        Err(AuthError::RefreshRejected(detail)) => {
            assert_eq!(detail, "invalid_grant: refresh token is revoked");
        }
        other => panic!("expected refresh_rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_still_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let config = oauth_config(&server.uri());
    let result = refresh(&Client::new(), &config, &expired_token("access-1")).await;
    match result {
        Err(AuthError::RefreshRejected(detail)) => {
            assert!(detail.contains("502"), "detail was {detail:?}");
            assert!(detail.contains("bad gateway"), "detail was {detail:?}");
        }
        other => panic!("expected refresh_rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_refresh_token_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "never-returned"
        })))
        .expect(0)
        .mount(&server)
        .await;

    let config = oauth_config(&server.uri());
    let token = Token {
        access_token: "access-1".to_string(),
        refresh_token: None,
        expires_at: None,
    };
    let result = refresh(&Client::new(), &config, &token).await;
    assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    server.verify().await;
}

#[tokio::test]
async fn client_secret_is_forwarded_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("client_secret=sec-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = oauth_config(&server.uri());
    config.client_secret = Some("sec-1".to_string());
    refresh(&Client::new(), &config, &expired_token("access-1"))
        .await
        .expect("refreshed");
    server.verify().await;
}
