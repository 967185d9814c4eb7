//! Data model for backups.

pub mod backup;

pub use backup::{
    BackupId, BackupMetadata, BackupStatus, BackupSummary, CollectionOutcome, OutcomeStatus,
};
