//! Object storage abstraction.
//!
//! Backups live in a bucket addressed by object key. The core only needs
//! four primitives: upload a local file, download to a local file, list by
//! prefix and delete.

pub mod gcs;
pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use crate::config::{BlobBackend, StorageConfig};
use crate::utils::errors::Result;

pub use gcs::GcsBlobStore;
pub use local::LocalBlobStore;

/// An object returned by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Full object key, e.g. `backups/backup-1/Cab.json`.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Trait for object storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the file at `local` to `key`, overwriting any existing object.
    async fn put(&self, local: &Path, key: &str) -> Result<()>;

    /// Download `key` into the file at `local`.
    /// Fails with [`BackupError::NotFound`](crate::BackupError::NotFound) if the object does not exist.
    async fn get(&self, key: &str, local: &Path) -> Result<()>;

    /// List all objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Build the configured backend.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        BlobBackend::Local => Ok(Arc::new(LocalBlobStore::new(&config.local_root))),
        BlobBackend::Gcs => Ok(Arc::new(GcsBlobStore::new(
            &config.endpoint,
            &config.bucket,
            config.access_token.clone(),
        )?)),
    }
}
