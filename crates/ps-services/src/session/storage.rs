//! Session Storage
//!
//! Key/value persistence for the signed-in session. Values are opaque
//! strings; the session decides their format.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ps_core::{PsError, PsResult};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> PsResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PsResult<()>;

    async fn remove(&self, key: &str) -> PsResult<()>;

    /// Storage name for logging
    fn name(&self) -> &str;
}

/// All keys in one JSON object file
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as empty
    async fn read_all(&self) -> PsResult<HashMap<String, String>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        serde_json::from_str(&text).map_err(|e| {
            PsError::Storage(format!("{} is not a session file: {}", self.path.display(), e))
        })
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> PsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| PsError::Storage(e.to_string()))?;
        fs::write(&self.path, text)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> PsError {
    PsError::Storage(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> PsResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    #[instrument(skip(self, value), fields(storage = "file"))]
    async fn set(&self, key: &str, value: String) -> PsResult<()> {
        // an unreadable file is overwritten
        let mut entries = self.read_all().await.unwrap_or_default();
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await?;
        debug!(path = %self.path.display(), "session entry written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> PsResult<()> {
        match self.read_all().await {
            Ok(mut entries) => {
                if entries.remove(key).is_none() {
                    return Ok(());
                }
                self.write_all(&entries).await
            }
            // unreadable file: nothing in it is usable
            Err(_) => self.write_all(&HashMap::new()).await,
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> PsResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PsResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PsResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
