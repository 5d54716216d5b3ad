use thiserror::Error;

/// Normalized authentication errors across the credential lifecycle.
///
/// Every failure condition carries a stable machine-readable code (see
/// [`AuthError::code`]) so operators can diagnose device-flow
/// misconfiguration precisely; the display text names the likely remediation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("This operation requires OAuth; the current configuration uses a Glean API token")]
    TokenConfigOnly,

    #[error("Device-flow login requires an interactive terminal")]
    NotInteractive,

    #[error("Could not fetch protected resource metadata: {0}. Contact your Glean administrator to verify the instance URL")]
    ProtectedResourceFetch(String),

    #[error("Protected resource metadata was not valid JSON: {0}")]
    ProtectedResourceParse(String),

    #[error("Protected resource metadata lists no authorization servers. Contact your Glean administrator to enable device-flow OAuth")]
    MissingAuthorizationServers,

    #[error("Protected resource metadata has no device-flow client id. Contact your Glean administrator to register one")]
    MissingDeviceClientId,

    #[error("Could not fetch authorization server metadata: {0}. Contact your Glean administrator to verify the OAuth issuer")]
    AuthServerMetadataFetch(String),

    #[error("Authorization server metadata was not valid JSON: {0}")]
    AuthServerMetadataParse(String),

    #[error("Authorization server metadata has no token endpoint")]
    MissingTokenEndpoint,

    #[error("Authorization server metadata has no device authorization endpoint")]
    MissingDeviceAuthorizationEndpoint,

    #[error("Device authorization request failed: {0}")]
    DeviceAuthorizationFailed(String),

    #[error("Unexpected response from the authorization server: {0}")]
    UnexpectedResponse(String),

    #[error("Authorization was not granted: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    AuthorizationDenied {
        error: String,
        description: Option<String>,
    },

    #[error("Timed out waiting for authorization; run login again")]
    AuthorizationTimeout,

    #[error("No stored tokens for this server; run login first")]
    NoStoredTokens,

    #[error("The stored token record has no refresh token; run login again")]
    NoRefreshToken,

    #[error("The authorization server rejected the refresh request: {0}")]
    RefreshRejected(String),

    #[error("No cached OAuth client metadata for this server; run login first")]
    MissingClientMetadata,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Stable machine-readable code for this error condition.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenConfigOnly => "token_config_only",
            Self::NotInteractive => "not_interactive",
            Self::ProtectedResourceFetch(_) => "protected_resource_fetch",
            Self::ProtectedResourceParse(_) => "protected_resource_parse",
            Self::MissingAuthorizationServers => "missing_authorization_servers",
            Self::MissingDeviceClientId => "missing_device_client_id",
            Self::AuthServerMetadataFetch(_) => "auth_server_metadata_fetch",
            Self::AuthServerMetadataParse(_) => "auth_server_metadata_parse",
            Self::MissingTokenEndpoint => "missing_token_endpoint",
            Self::MissingDeviceAuthorizationEndpoint => "missing_device_authorization_endpoint",
            Self::DeviceAuthorizationFailed(_) => "device_authorization_failed",
            Self::UnexpectedResponse(_) => "unexpected_response",
            Self::AuthorizationDenied { .. } => "authorization_denied",
            Self::AuthorizationTimeout => "authorization_timeout",
            Self::NoStoredTokens => "no_stored_tokens",
            Self::NoRefreshToken => "no_refresh_token",
            Self::RefreshRejected(_) => "refresh_rejected",
            Self::MissingClientMetadata => "missing_client_metadata",
            Self::Configuration(_) => "configuration",
            Self::Network(_) => "network",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_discovery_cause() {
        let errors = [
            AuthError::ProtectedResourceFetch("down".into()),
            AuthError::ProtectedResourceParse("bad".into()),
            AuthError::MissingAuthorizationServers,
            AuthError::MissingDeviceClientId,
            AuthError::AuthServerMetadataFetch("down".into()),
            AuthError::AuthServerMetadataParse("bad".into()),
            AuthError::MissingTokenEndpoint,
            AuthError::MissingDeviceAuthorizationEndpoint,
        ];
        let mut codes: Vec<&str> = errors.iter().map(AuthError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn denied_display_includes_server_description() {
        let err = AuthError::AuthorizationDenied {
            error: "access_denied".into(),
            description: Some("user cancelled".into()),
        };
        let text = err.to_string();
        assert!(text.contains("access_denied"));
        assert!(text.contains("user cancelled"));
    }

    #[test]
    fn remediation_text_names_the_administrator() {
        let err = AuthError::MissingDeviceClientId;
        assert!(err.to_string().contains("administrator"));
    }
}
