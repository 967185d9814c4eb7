//! Backup identifiers, per-collection outcomes and backup metadata.
//!
//! Metadata is serialized as `backups/<id>/metadata.json` and is the
//! authoritative record of what a backup contains.

use crate::utils::errors::{BackupError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root namespace for every backup object.
pub const NAMESPACE: &str = "backups";

/// Object name of the metadata document inside a backup prefix.
pub const METADATA_OBJECT: &str = "metadata.json";

const ID_PREFIX: &str = "backup-";
const ID_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Identifier of a backup, e.g. `backup-2024-03-01-09-15-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupId(String);

impl BackupId {
    /// Derive an identifier from a creation time (second resolution).
    pub fn from_time(time: DateTime<Utc>) -> Self {
        BackupId(format!("{}{}", ID_PREFIX, time.format(ID_TIME_FORMAT)))
    }

    /// Accept an identifier as stored. It must be usable as a single key
    /// segment and is kept verbatim so it maps back to the same prefix.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.contains('/') || raw == "." || raw == ".." {
            return Err(BackupError::InvalidId(raw.to_string()));
        }
        Ok(BackupId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable date derived from the identifier.
    pub fn date_label(&self) -> String {
        let stamp = self.0.strip_prefix(ID_PREFIX).unwrap_or(&self.0);
        match NaiveDateTime::parse_from_str(stamp, ID_TIME_FORMAT) {
            Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => stamp.to_string(),
        }
    }

    /// `backups/<id>/`
    pub fn prefix(&self) -> String {
        format!("{}/{}/", NAMESPACE, self.0)
    }

    /// `backups/<id>/<collection>.json`
    pub fn collection_key(&self, collection: &str) -> String {
        format!("{}{}.json", self.prefix(), collection)
    }

    /// `backups/<id>/metadata.json`
    pub fn metadata_key(&self) -> String {
        format!("{}{}", self.prefix(), METADATA_OBJECT)
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Result of backing up a single collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOutcome {
    pub name: String,
    pub record_count: u64,
    pub file_size: u64,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionOutcome {
    pub fn success(name: &str, record_count: u64, file_size: u64) -> Self {
        Self {
            name: name.to_string(),
            record_count,
            file_size,
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    pub fn failed(name: &str, error: impl fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            record_count: 0,
            file_size: 0,
            status: OutcomeStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Completed,
    Partial,
    Failed,
}

impl BackupStatus {
    /// `failed` with no successes, `completed` with no failures, else `partial`.
    pub fn from_counts(succeeded: usize, total: usize) -> Self {
        if succeeded == 0 {
            BackupStatus::Failed
        } else if succeeded == total {
            BackupStatus::Completed
        } else {
            BackupStatus::Partial
        }
    }

    pub fn from_outcomes(outcomes: &[CollectionOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self::from_counts(succeeded, outcomes.len())
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackupStatus::Completed => "completed",
            BackupStatus::Partial => "partial",
            BackupStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Full description of one backup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub id: BackupId,
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub collections: Vec<CollectionOutcome>,
    pub total_size: u64,
    pub status: BackupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BackupMetadata {
    /// Assemble metadata from the outcomes of a finished run.
    pub fn assemble(
        id: BackupId,
        timestamp: DateTime<Utc>,
        collections: Vec<CollectionOutcome>,
        description: Option<String>,
    ) -> Self {
        let total_size = collections
            .iter()
            .filter(|c| c.is_success())
            .map(|c| c.file_size)
            .sum();
        let status = BackupStatus::from_outcomes(&collections);
        Self {
            date: id.date_label(),
            id,
            timestamp,
            collections,
            total_size,
            status,
            description,
        }
    }
}

/// Catalog view of a backup, reconstructed from object keys alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub id: BackupId,
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub collections: Vec<String>,
    pub status: BackupStatus,
}
