use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key/value store persisted as a single JSON object on disk.
///
/// The whole map is held in memory and rewritten on every mutation through a
/// temporary file, so a crash mid-write leaves the previous contents intact.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| {
                AppError::Storage(format!("Corrupt key/value file {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        info!(
            "Key/value file opened: {} ({} keys)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        let json = serde_json::to_vec(entries)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Key/value file written: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}
