//! Page document storage
//!
//! Both backends key documents by `_id` and honor a TTL on `last_modified`:
//! once [`PageStore::ensure_ttl_index`] has been called, documents older than
//! the retention window are purged on load and never returned.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::PageDocument;

/// Errors raised by a page store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Backing storage for page documents
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Install the age-based expiration on `last_modified`
    async fn ensure_ttl_index(&self, retention: chrono::Duration) -> Result<(), StorageError>;

    /// Insert or replace the document stored under its `_id`
    async fn upsert(&self, document: &PageDocument) -> Result<(), StorageError>;

    /// Delete the document stored under `id`; deleting a missing document succeeds
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Every live document
    async fn load_all(&self) -> Result<Vec<PageDocument>, StorageError>;
}

fn is_live(document: &PageDocument, retention: Option<chrono::Duration>) -> bool {
    retention.map_or(true, |retention| Utc::now() - document.last_modified <= retention)
}

/// Process-local store, used when no data directory is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, PageDocument>>,
    retention: Mutex<Option<chrono::Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<PageDocument> {
        self.documents.lock().ok()?.get(id).cloned()
    }

    fn lock_documents(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, PageDocument>>, StorageError> {
        self.documents
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Failed to lock documents: {}", e)))
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn ensure_ttl_index(&self, retention: chrono::Duration) -> Result<(), StorageError> {
        let mut current = self
            .retention
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Failed to lock retention: {}", e)))?;
        *current = Some(retention);
        Ok(())
    }

    async fn upsert(&self, document: &PageDocument) -> Result<(), StorageError> {
        self.lock_documents()?
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.lock_documents()?.remove(id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<PageDocument>, StorageError> {
        let retention = self.retention.lock().map(|r| *r).unwrap_or(None);
        let mut documents = self.lock_documents()?;
        documents.retain(|_, document| is_live(document, retention));
        Ok(documents.values().cloned().collect())
    }
}

/// One JSON file per page inside a data directory
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    retention: Mutex<Option<chrono::Duration>>,
}

impl FileStore {
    /// Open (and create if needed) the store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!("Page documents stored in {}", root.display());
        Ok(Self {
            root,
            retention: Mutex::new(None),
        })
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    fn retention(&self) -> Option<chrono::Duration> {
        self.retention.lock().map(|r| *r).unwrap_or(None)
    }
}

#[async_trait]
impl PageStore for FileStore {
    async fn ensure_ttl_index(&self, retention: chrono::Duration) -> Result<(), StorageError> {
        let mut current = self
            .retention
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Failed to lock retention: {}", e)))?;
        *current = Some(retention);
        Ok(())
    }

    async fn upsert(&self, document: &PageDocument) -> Result<(), StorageError> {
        let body = serde_json::to_vec(document)?;
        let path = self.document_path(&document.id);
        // Write aside and rename so a crash never leaves a truncated document
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Page document {} already gone", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_all(&self) -> Result<Vec<PageDocument>, StorageError> {
        let retention = self.retention();
        let mut documents = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let body = tokio::fs::read(&path).await?;
            let document: PageDocument = match serde_json::from_slice(&body) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping unreadable page document {}: {}", path.display(), e);
                    continue;
                }
            };

            if is_live(&document, retention) {
                documents.push(document);
            } else {
                debug!("Purging expired page document {}", document.id);
                self.delete(&document.id).await?;
            }
        }

        Ok(documents)
    }
}
