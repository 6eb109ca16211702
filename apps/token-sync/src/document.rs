//! The local document file, standing in for the design tool's shared data.
//!
//! The file is one JSON object keyed like the host document
//! (`values`, `themes`, `usedTokenSet`, ...). Every write replaces the file
//! atomically.

use crate::error::AppError;

use sync_core::error::StorageError;
use sync_core::sync::DocumentStorage;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

pub struct FileDocumentStorage {
    path: PathBuf,
    keys: Mutex<Map<String, Value>>,
}

impl FileDocumentStorage {
    /// Opens `path`. A missing file is an empty document.
    ///
    /// # Errors
    ///
    /// [`AppError::Document`] when the file exists but cannot be read or is
    /// not a JSON object.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let keys = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(keys)) => keys,
                Ok(_) => return Err(AppError::document(&path, "not a JSON object")),
                Err(e) => return Err(AppError::document(&path, e.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Document {} does not exist yet, starting empty", path.display());
                Map::new()
            }
            Err(e) => return Err(AppError::document(&path, e.to_string())),
        };

        debug!("Opened document {} ({} keys)", path.display(), keys.len());
        Ok(Self {
            path,
            keys: Mutex::new(keys),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, keys: &Map<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(keys)?;
        let temp_path = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::host_document(parent.display().to_string(), e.to_string()))?;
        }

        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| StorageError::host_document(temp_path.display().to_string(), e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::host_document(self.path.display().to_string(), e.to_string()))
    }
}

#[async_trait]
impl DocumentStorage for FileDocumentStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let keys = self.keys.lock().await;
        keys.get(key)
            .map(|value| serde_json::to_string(value).map_err(StorageError::from))
            .transpose()
    }

    /// `value` is the JSON text of the key; it is stored as JSON so the
    /// file stays readable.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let parsed: Value = serde_json::from_str(value)
            .map_err(|e| StorageError::host_document(key, e.to_string()))?;

        let mut keys = self.keys.lock().await;
        keys.insert(key.to_string(), parsed);
        self.persist(&keys).await
    }
}
