//! Durable key/value storage backed by a JSON file
//!
//! Desktop counterpart of browser local storage. Values survive restarts but
//! are not encrypted; prefer [`KeyringSecureStore`](crate::KeyringSecureStore)
//! where an OS keychain is available.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const STORE_FILE_NAME: &str = "session.json";

/// JSON-file backed store
///
/// The whole map is kept in memory and rewritten on every mutation.
pub struct JsonFileStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Store file is corrupted, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        debug!(path = ?path, keys = entries.len(), "Opened JSON file store");

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// Open the store in the platform data directory
    pub async fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| {
                BridgeError::NotAvailable("No data directory on this platform".to_string())
            })?;

        Self::open(dir.join("admin-client-core").join(STORE_FILE_NAME)).await
    }

    /// Create a store that never touches disk (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(entries).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode store: {}", e))
        })?;

        // Write-then-rename keeps the previous file intact if we crash mid-write.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(BridgeError::Io)?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(BridgeError::Io)?;

        Ok(())
    }
}

#[async_trait]
impl SecureStore for JsonFileStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), STANDARD.encode(value));
        self.persist(&entries).await?;
        debug!(key = key, "Stored value");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .map(|encoded| {
                STANDARD.decode(encoded).map_err(|e| {
                    BridgeError::OperationFailed(format!("Failed to decode value: {}", e))
                })
            })
            .transpose()
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
            debug!(key = key, "Deleted value");
        }
        Ok(())
    }

    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().await.contains_key(key))
    }
}
