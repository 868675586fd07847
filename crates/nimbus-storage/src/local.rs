use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use std::path::{Component, Path, PathBuf};
use tokio_util::io::ReaderStream;

use nimbus_core::{Result, StorageError};

use crate::chunk::{CHUNK_SIZE, lazy_chunks};
use crate::provider::{ObjectStorage, ObjectStream};

const PROVIDER: &str = "local";

/// Filesystem-backed storage, one file per key under `root`.
///
/// Deleting a missing key succeeds (idempotent).
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            StorageError::Configuration(format!(
                "cannot create local storage root {}: {e}",
                root.display()
            ))
        })?;
        tracing::info!(root = %root.display(), "local storage ready");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Map a key to a path under root. Keys may contain `/` but must stay inside root.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StorageError::backend_msg(
                PROVIDER,
                format!("invalid object key '{key}'"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

fn map_io(key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::not_found(key)
    } else {
        StorageError::backend(PROVIDER, err)
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        tracing::debug!(key, bytes = data.len(), "local save");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::backend(PROVIDER, e))?;
        }
        // Write beside the target and rename so readers never see a torn object.
        let tmp = path.with_file_name(format!(
            ".{}.{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("object"),
            uuid::Uuid::now_v7()
        ));
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| StorageError::backend(PROVIDER, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::backend(PROVIDER, e));
        }
        Ok(())
    }

    async fn load_once(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key)?;
        tracing::debug!(key, "local load");
        let data = tokio::fs::read(&path).await.map_err(|e| map_io(key, e))?;
        Ok(Bytes::from(data))
    }

    fn load_stream(&self, key: &str) -> ObjectStream {
        let path = self.object_path(key);
        let key = key.to_string();
        lazy_chunks(async move {
            let path = path?;
            tracing::debug!(key = %key, "local stream open");
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| map_io(&key, e))?;
            Ok(ReaderStream::with_capacity(file, CHUNK_SIZE)
                .map_err(|e| StorageError::backend(PROVIDER, e)))
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::backend(PROVIDER, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(key, "delete of missing object ignored");
                Ok(())
            }
            Err(e) => Err(StorageError::backend(PROVIDER, e)),
        }
    }
}
