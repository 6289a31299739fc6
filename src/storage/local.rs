//! Local filesystem object store implementation.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::{ObjectMeta, ObjectStore, ObjectStream, StorageError, StorageResult};

/// Object store backed by a directory on the local filesystem.
///
/// Objects live as flat files under `{root}/{bucket}/`. Content types are
/// not persisted; they are derived from the key's extension at stat time.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
}

impl LocalObjectStore {
    /// Create a new local object store.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Resolve a key to its path, rejecting anything that is not a single
    /// flat file name.
    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        if !valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir().join(key))
    }
}

/// Keys are flat names: no separators, no traversal, no hidden files.
fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\', '\0'])
        && !key.chars().any(|c| c.is_control())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        let dir = self.bucket_dir();
        fs::create_dir_all(&dir).await?;
        debug!("Bucket directory ready: {}", dir.display());
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn stat(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.object_path(key)?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        if meta.is_dir() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        Ok(ObjectMeta::new(key, meta.len()).with_content_type(content_type.essence_str()))
    }

    async fn put(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        _content_type: &str,
    ) -> StorageResult<u64> {
        let final_path = self.object_path(key)?;

        // Stream to a temp file first so a failed put never leaves a
        // partial object under the final key.
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = self.bucket_dir().join(format!(".put-{}-{}", key, nonce));

        let mut file = fs::File::create(&temp_path).await?;
        let written = match tokio::io::copy(reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::Io(e));
            }
        };
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &final_path).await?;
        debug!("Stored {} bytes as {}", written, final_path.display());
        Ok(written)
    }

    async fn get(&self, key: &str) -> StorageResult<(ObjectMeta, ObjectStream)> {
        let meta = self.stat(key).await?;
        let path = self.object_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok((meta, ReaderStream::new(file).boxed()))
    }
}
