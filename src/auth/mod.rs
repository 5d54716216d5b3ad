//! OAuth device-flow credential lifecycle: discovery, authorization,
//! polling, refresh, and persistence.

pub mod device_code;
pub mod discovery;
pub mod error;
pub mod interop;
pub mod poll;
pub mod prompt;
pub mod refresh;
pub mod service;
pub mod store;
pub mod token;

pub use device_code::{oauth_scopes, DeviceAuthorization};
pub use error::AuthError;
pub use service::AuthService;
pub use store::{ClientMetadata, FileStore, MetadataStore, StoreConfig, TokenStore};
pub use token::{Token, TokenResponse};
