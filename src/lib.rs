//! glean-auth — credential lifecycle management for Glean clients.
//!
//! Implements the client side of the OAuth 2.0 device authorization grant
//! (RFC 8628): server metadata discovery, interactive authorization with a
//! polling race, token persistence, expiration detection, and refresh.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use glean_auth::prelude::*;
//!
//! # async fn example() -> Result<(), AuthError> {
//! let store = Arc::new(FileStore::new_default());
//! let config = glean_auth::config::get_config(store.as_ref())?;
//! let service = AuthService::new(store.clone(), store);
//! if service.ensure_token_presence(&config).await? {
//!     println!("credential ready");
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
