//! Snapshot catalog: reconstructs known backups from object keys and
//! fetches individual metadata documents on demand.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{error, info, warn};

use super::BackupContext;
use crate::blob::BlobEntry;
use crate::models::backup::{METADATA_OBJECT, NAMESPACE};
use crate::models::{BackupId, BackupMetadata, BackupStatus, BackupSummary};
use crate::utils::errors::Result;
use crate::utils::staging;

/// List every backup under the namespace, newest first.
///
/// Best effort: a listing failure is logged and yields an empty list, so an
/// empty result does not prove that no backups exist.
pub async fn list_backups(ctx: &BackupContext) -> Vec<BackupSummary> {
    let prefix = format!("{}/", NAMESPACE);
    match ctx.blobs.list(&prefix).await {
        Ok(entries) => summarize(&entries, &ctx.collections),
        Err(e) => {
            error!(error = %e, "Failed to list backups");
            Vec::new()
        }
    }
}

struct Group {
    earliest: DateTime<Utc>,
    present: HashSet<String>,
}

/// Group object keys `backups/<id>/...` into summaries.
pub fn summarize(entries: &[BlobEntry], known: &[String]) -> Vec<BackupSummary> {
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();

    for entry in entries {
        let mut parts = entry.name.split('/');
        let (Some(namespace), Some(id)) = (parts.next(), parts.next()) else {
            continue;
        };
        if namespace != NAMESPACE || id.is_empty() {
            continue;
        }
        let rest: Vec<&str> = parts.collect();

        let group = groups.entry(id).or_insert_with(|| Group {
            earliest: entry.created_at,
            present: HashSet::new(),
        });
        if entry.created_at < group.earliest {
            group.earliest = entry.created_at;
        }

        // Only immediate children name collections
        if let [object] = rest.as_slice() {
            if *object == METADATA_OBJECT {
                continue;
            }
            if let Some(name) = object.strip_suffix(".json") {
                if known.iter().any(|k| k == name) {
                    group.present.insert(name.to_string());
                }
            }
        }
    }

    let mut summaries: Vec<BackupSummary> = groups
        .into_iter()
        .filter_map(|(raw, group)| {
            let id = BackupId::parse(raw).ok()?;
            let collections: Vec<String> = known
                .iter()
                .filter(|k| group.present.contains(k.as_str()))
                .cloned()
                .collect();
            let status = BackupStatus::from_counts(collections.len(), known.len());
            Some(BackupSummary {
                date: id.date_label(),
                id,
                timestamp: group.earliest,
                collections,
                status,
            })
        })
        .collect();

    summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    summaries
}

/// Download and parse the metadata of one backup.
///
/// Returns `None` if the metadata object is missing or unreadable; the
/// caller decides whether that is an error.
pub async fn get_backup_details(ctx: &BackupContext, id: &BackupId) -> Option<BackupMetadata> {
    let dir = match staging::create(&ctx.staging_dir, "details") {
        Ok(dir) => dir,
        Err(e) => {
            warn!(backup_id = %id, error = %e, "Failed to create staging directory");
            return None;
        }
    };

    let result = fetch_metadata(ctx, id, dir.path()).await;
    staging::cleanup(dir);

    match result {
        Ok(metadata) => Some(metadata),
        Err(e) if e.is_not_found() => {
            info!(backup_id = %id, "Backup metadata not found");
            None
        }
        Err(e) => {
            warn!(backup_id = %id, error = %e, "Failed to read backup metadata");
            None
        }
    }
}

async fn fetch_metadata(ctx: &BackupContext, id: &BackupId, dir: &Path) -> Result<BackupMetadata> {
    let path = dir.join(METADATA_OBJECT);
    ctx.blobs.get(&id.metadata_key(), &path).await?;
    let content = tokio::fs::read(&path).await?;
    Ok(serde_json::from_slice(&content)?)
}
