//! Backup, catalog, restore and retention operations.
//!
//! Every operation takes an explicit [`BackupContext`] carrying the live
//! store and object storage handles.

pub mod catalog;
pub mod restore;
pub mod retention;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use crate::blob::{self, BlobStore};
use crate::config::{validate_collections, Config};
use crate::db;
use crate::store::RecordStore;
use crate::utils::errors::Result;

pub use catalog::{get_backup_details, list_backups};
pub use restore::restore_from_backup;
pub use retention::delete_backup;
pub use writer::create_backup;

#[derive(Clone)]
pub struct BackupContext {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    /// Collections covered by backups, in metadata order
    pub collections: Vec<String>,
    /// Parent of the per-operation staging directories
    pub staging_dir: PathBuf,
}

impl BackupContext {
    /// Fails with [`BackupError::Config`](crate::BackupError::Config) if a
    /// collection name cannot be used as an object key.
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        collections: Vec<String>,
        staging_dir: PathBuf,
    ) -> Result<Self> {
        validate_collections(&collections)?;
        Ok(Self {
            records,
            blobs,
            collections,
            staging_dir,
        })
    }

    /// Open the SQLite live store and the configured object storage.
    pub fn from_config(config: &Config) -> Result<Self> {
        let records = db::open(&config.database)?;
        let blobs = blob::from_config(&config.storage)?;
        Self::new(
            Arc::new(records),
            blobs,
            config.backup.collections.clone(),
            config.backup.staging_dir.clone(),
        )
    }

    pub fn is_known(&self, collection: &str) -> bool {
        self.collections.iter().any(|c| c == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MemoryBlobStore, MemoryRecordStore};
    use super::*;
    use crate::utils::errors::BackupError;

    fn context(collections: &[&str]) -> Result<BackupContext> {
        BackupContext::new(
            Arc::new(MemoryRecordStore::default()),
            Arc::new(MemoryBlobStore::default()),
            collections.iter().map(|c| c.to_string()).collect(),
            std::env::temp_dir(),
        )
    }

    #[test]
    fn test_new_rejects_unusable_collections() {
        let rejected: [&[&str]; 5] = [&["metadata"], &[""], &["Cab", ".."], &["Cab", "Cab"], &[]];
        for collections in rejected {
            assert!(
                matches!(context(collections), Err(BackupError::Config(_))),
                "{:?} should be rejected",
                collections
            );
        }

        let ctx = context(&["Cab", "Ride"]).unwrap();
        assert!(ctx.is_known("Ride"));
        assert!(!ctx.is_known("metadata"));
    }
}
