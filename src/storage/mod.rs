//! Object store abstraction layer.
//!
//! Provides a trait-based gateway to durable blob storage with a local
//! filesystem implementation. An S3-style backend can slot in behind the
//! same trait without touching the upload/download handlers.

mod error;
mod local;
mod traits;

use std::path::PathBuf;
use std::sync::Arc;

pub use error::{StorageError, StorageResult};
pub use local::LocalObjectStore;
pub use traits::{ObjectMeta, ObjectStore, ObjectStream};

/// Object store configuration.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Local filesystem storage rooted at the given directory.
    Local { root: PathBuf, bucket: String },
}

/// Create an object store from configuration.
pub fn create_store(config: StoreConfig) -> Arc<dyn ObjectStore> {
    match config {
        StoreConfig::Local { root, bucket } => Arc::new(LocalObjectStore::new(root, bucket)),
    }
}
