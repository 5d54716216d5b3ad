use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use super::token::Token;

/// Storage abstraction for persisted OAuth tokens, keyed by server identity.
pub trait TokenStore: Send + Sync {
    fn load(&self, server: &str) -> Result<Option<Token>, AuthError>;
    fn save(&self, server: &str, token: &Token) -> Result<(), AuthError>;
    fn clear(&self, server: &str) -> Result<(), AuthError>;
}

/// Storage abstraction for cached OAuth client metadata, keyed by server
/// identity. Cached metadata lets repeated authorizations skip the
/// protected-resource fetch.
pub trait MetadataStore: Send + Sync {
    fn load(&self, server: &str) -> Result<Option<ClientMetadata>, AuthError>;
    fn save(&self, server: &str, metadata: &ClientMetadata) -> Result<(), AuthError>;
    fn clear(&self, server: &str) -> Result<(), AuthError>;
}

/// OAuth client metadata discovered for a server.
///
/// An absent secret is dropped from the serialized form rather than written
/// as a null; a present-but-empty string is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Configuration for file-backed credential storage.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_glean_dir()
    }
}

/// File-backed token and metadata store using TOML files under one
/// directory (`~/.glean` by default).
///
/// Files are read-then-written without locking; last writer wins. The flows
/// are user-interactive and not expected to run concurrently across
/// processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_glean_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, server: &str, kind: &str) -> PathBuf {
        let server = normalize_label(server);
        self.base_dir.join(format!("{server}.{kind}.toml"))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn write_restricted(path: &Path, contents: &str) -> Result<(), AuthError> {
        Self::ensure_parent(path)?;
        fs::write(path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn read_optional(path: &Path) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }

    fn remove_optional(path: &Path) -> Result<(), AuthError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

impl TokenStore for FileStore {
    fn load(&self, server: &str) -> Result<Option<Token>, AuthError> {
        let path = self.file_path(server, "tokens");
        let Some(raw) = Self::read_optional(&path)? else {
            debug!(server, "no stored tokens");
            return Ok(None);
        };
        let file: TokenFile = toml::from_str(&raw)?;
        Ok(Some(file.token))
    }

    fn save(&self, server: &str, token: &Token) -> Result<(), AuthError> {
        let path = self.file_path(server, "tokens");
        let file = TokenFile {
            version: 1,
            server: server.to_string(),
            token: token.clone(),
            saved_at: Utc::now(),
        };
        Self::write_restricted(&path, &toml::to_string(&file)?)
    }

    fn clear(&self, server: &str) -> Result<(), AuthError> {
        Self::remove_optional(&self.file_path(server, "tokens"))
    }
}

impl MetadataStore for FileStore {
    fn load(&self, server: &str) -> Result<Option<ClientMetadata>, AuthError> {
        let path = self.file_path(server, "oauth");
        let Some(raw) = Self::read_optional(&path)? else {
            return Ok(None);
        };
        let file: MetadataFile = toml::from_str(&raw)?;
        Ok(Some(file.metadata))
    }

    fn save(&self, server: &str, metadata: &ClientMetadata) -> Result<(), AuthError> {
        let path = self.file_path(server, "oauth");
        let file = MetadataFile {
            version: 1,
            server: server.to_string(),
            metadata: metadata.clone(),
            saved_at: Utc::now(),
        };
        Self::write_restricted(&path, &toml::to_string(&file)?)
    }

    fn clear(&self, server: &str) -> Result<(), AuthError> {
        Self::remove_optional(&self.file_path(server, "oauth"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    server: String,
    token: Token,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataFile {
    version: u32,
    server: String,
    metadata: ClientMetadata,
    saved_at: DateTime<Utc>,
}

fn default_glean_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".glean"))
        .unwrap_or_else(|| PathBuf::from(".glean"))
}

/// Stable filesystem label for a server identity (base URL host).
pub fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' || lower == '.' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(StoreConfig::new(dir.path().to_path_buf()));
        (dir, store)
    }

    fn sample_token() -> Token {
        Token {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
        }
    }

    #[test]
    fn token_round_trip_works() {
        let (_dir, store) = temp_store();
        TokenStore::save(&store, "acme.glean.com", &sample_token()).unwrap();
        let loaded = TokenStore::load(&store, "acme.glean.com").unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn clear_removes_token() {
        let (_dir, store) = temp_store();
        TokenStore::save(&store, "acme.glean.com", &sample_token()).unwrap();
        TokenStore::clear(&store, "acme.glean.com").unwrap();
        assert!(TokenStore::load(&store, "acme.glean.com").unwrap().is_none());
    }

    #[test]
    fn clear_missing_token_is_not_an_error() {
        let (_dir, store) = temp_store();
        TokenStore::clear(&store, "acme.glean.com").unwrap();
    }

    #[test]
    fn metadata_round_trip_works() {
        let (_dir, store) = temp_store();
        let metadata = ClientMetadata {
            client_id: "client-1".to_string(),
            client_secret: None,
        };
        MetadataStore::save(&store, "acme.glean.com", &metadata).unwrap();
        let loaded = MetadataStore::load(&store, "acme.glean.com")
            .unwrap()
            .unwrap();
        assert_eq!(loaded.client_id, "client-1");
        assert!(loaded.client_secret.is_none());
    }

    #[test]
    fn absent_secret_is_not_serialized() {
        let metadata = ClientMetadata {
            client_id: "client-1".to_string(),
            client_secret: None,
        };
        let serialized = toml::to_string(&metadata).unwrap();
        assert!(!serialized.contains("client_secret"));
    }

    #[test]
    fn empty_secret_round_trips_verbatim() {
        let (_dir, store) = temp_store();
        let metadata = ClientMetadata {
            client_id: "client-1".to_string(),
            client_secret: Some(String::new()),
        };
        MetadataStore::save(&store, "acme.glean.com", &metadata).unwrap();
        let loaded = MetadataStore::load(&store, "acme.glean.com")
            .unwrap()
            .unwrap();
        assert_eq!(loaded.client_secret.as_deref(), Some(""));
    }

    #[test]
    fn token_and_metadata_files_do_not_collide() {
        let (dir, store) = temp_store();
        TokenStore::save(&store, "acme.glean.com", &sample_token()).unwrap();
        let metadata = ClientMetadata {
            client_id: "client-1".to_string(),
            client_secret: None,
        };
        MetadataStore::save(&store, "acme.glean.com", &metadata).unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn normalize_label_lowercases_and_replaces() {
        assert_eq!(normalize_label("Acme.Glean.Com"), "acme.glean.com");
        assert_eq!(normalize_label("acme glean"), "acme-glean");
        assert_eq!(normalize_label("  "), "default");
    }
}
