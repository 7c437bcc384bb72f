use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tonewiki_backend::WikiConfig;
use tonewiki_store::{BlobStore, FsBlobStore, InMemoryBlobStore};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    /// Mark the session cookie `Secure`; enable behind HTTPS.
    pub secure_cookies: bool,
    pub session_cookie_name: String,
    pub max_upload_bytes: usize,
    pub wiki: WikiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            storage: StorageConfig::default(),
            secure_cookies: false,
            session_cookie_name: "tonewiki-session".into(),
            max_upload_bytes: 16 * 1024 * 1024,
            wiki: WikiConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }
}

/// Where blobs live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Lost on exit.
    #[default]
    Memory,
    Fs {
        root: PathBuf,
    },
}

impl StorageConfig {
    pub fn open(&self) -> ServerResult<Arc<dyn BlobStore>> {
        Ok(match self {
            Self::Memory => Arc::new(InMemoryBlobStore::new()),
            Self::Fs { root } => Arc::new(FsBlobStore::open(root)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage, StorageConfig::Memory);
        assert!(!c.secure_cookies);
        assert_eq!(c.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn parse_toml() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            secure_cookies = true

            [storage]
            kind = "fs"
            root = "/var/lib/tonewiki"

            [wiki]
            image_base_url = "https://cdn.example.com/images"

            [wiki.summary]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert!(c.secure_cookies);
        assert_eq!(
            c.storage,
            StorageConfig::Fs {
                root: "/var/lib/tonewiki".into()
            }
        );
        assert_eq!(c.wiki.image_base_url, "https://cdn.example.com/images");
        assert!(!c.wiki.summary.enabled);
        assert_eq!(c.wiki.max_comment_chars, 500);
        assert_eq!(c.session_cookie_name, "tonewiki-session");
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            ServerConfig::from_toml_str("bind_addr = 5"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonewiki.toml");
        std::fs::write(&path, "max_upload_bytes = 1024\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().max_upload_bytes, 1024);
        assert!(matches!(
            ServerConfig::load(dir.path().join("missing.toml")),
            Err(ServerError::Io(_))
        ));
    }

    #[test]
    fn fs_storage_opens() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig::Fs {
            root: dir.path().join("blobs"),
        };
        let store = storage.open().unwrap();
        store.write("content", "chord.md", b"# Chord").unwrap();
        assert!(dir.path().join("blobs/content/chord.md").is_file());
    }
}
