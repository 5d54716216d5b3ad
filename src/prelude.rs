//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthService, ClientMetadata, DeviceAuthorization, FileStore, MetadataStore, Token,
    TokenResponse, TokenStore,
};
pub use crate::config::{BasicConfig, GleanConfig, OAuthConfig, TokenConfig};
