//! Interoperability mirror for the companion proxy tool.
//!
//! The proxy keeps its own credential cache keyed by a hash of the server
//! URL. We mirror the discovered client metadata and the current token
//! there, with `expires_in` forced to one second so the proxy enters its own
//! refresh cycle immediately instead of trusting a stale copy.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::AuthError;
use super::store::ClientMetadata;
use super::token::Token;

/// Placeholder; the proxy requires the field but never uses the value for
/// the device flow.
const MIRROR_REDIRECT_URI: &str = "http://localhost:8080/callback";

#[derive(Debug, Serialize)]
struct MirrorClientInfo<'a> {
    client_id: &'a str,
    redirect_uris: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MirrorTokenRecord<'a> {
    access_token: &'a str,
    token_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    expires_in: u64,
}

/// Write the proxy's client-info and token files for a server.
pub fn write_mirror(
    dir: &Path,
    server_url: &str,
    metadata: &ClientMetadata,
    token: &Token,
) -> Result<(), AuthError> {
    fs::create_dir_all(dir)?;
    let key = server_url_hash(server_url);

    let client_info = MirrorClientInfo {
        client_id: &metadata.client_id,
        redirect_uris: [MIRROR_REDIRECT_URI],
        client_secret: metadata.client_secret.as_deref(),
    };
    write_json(&dir.join(format!("{key}_client_info.json")), &client_info)?;

    let record = MirrorTokenRecord {
        access_token: &token.access_token,
        token_type: "Bearer",
        refresh_token: token.refresh_token.as_deref(),
        // Forces the proxy into its own refresh cycle immediately.
        expires_in: 1,
    };
    write_json(&dir.join(format!("{key}_tokens.json")), &record)?;

    debug!(server_url, key, "wrote proxy mirror");
    Ok(())
}

/// Default mirror directory used by the proxy tool (`~/.mcp-auth`).
pub fn default_mirror_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".mcp-auth"))
        .unwrap_or_else(|| PathBuf::from(".mcp-auth"))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AuthError> {
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn server_url_hash(server_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(server_url.as_bytes());
    let hash = hasher.finalize();
    format!("{hash:x}")[..16].to_string()
}
