//! Fleet Backup Library
//!
//! Snapshots the collections of the fleet data store to object storage and
//! restores, lists and deletes those snapshots.

pub mod blob;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use blob::{BlobEntry, BlobStore};
pub use config::Config;
pub use models::{BackupId, BackupMetadata, BackupStatus, BackupSummary, CollectionOutcome};
pub use services::{
    create_backup, delete_backup, get_backup_details, list_backups, restore_from_backup,
    BackupContext,
};
pub use store::RecordStore;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
