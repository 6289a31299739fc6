//! Object store trait definitions.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use super::StorageResult;

/// Byte stream returned by [`ObjectStore::get`].
pub type ObjectStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Metadata recorded for a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type (MIME), when the backend records one.
    pub content_type: Option<String>,
}

impl ObjectMeta {
    /// Create metadata for an object of a known size.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            content_type: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Durable blob storage behind the chat server.
///
/// Objects are write-once: the server never updates or deletes a stored
/// object, it only puts new keys and streams existing ones back out.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check that the bucket exists, creating it if necessary.
    ///
    /// Called once at startup; failure here aborts the server.
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get metadata for an object.
    async fn stat(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Stream an object's bytes into storage under `key`.
    ///
    /// Returns the number of bytes written. A failed put must not leave a
    /// partial object behind.
    async fn put(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Fetch an object as a byte stream plus its recorded metadata.
    async fn get(&self, key: &str) -> StorageResult<(ObjectMeta, ObjectStream)>;
}
