//! Restore engine: replaces live collections with the contents of a backup.
//!
//! Collections are restored one at a time and the first failure aborts the
//! rest. There is no cross-collection transaction: collections restored
//! before the failure keep their restored contents, later ones are untouched.

use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

use super::catalog::get_backup_details;
use super::BackupContext;
use crate::models::BackupId;
use crate::utils::errors::{BackupError, Result};
use crate::utils::staging;

/// Restore `selected` collections (all tracked collections when `None` or
/// empty) from backup `id`.
pub async fn restore_from_backup(
    ctx: &BackupContext,
    id: &BackupId,
    selected: Option<&[String]>,
) -> Result<()> {
    let dir = staging::create(&ctx.staging_dir, "restore")?;
    let result = run_restore(ctx, id, selected, dir.path()).await;
    staging::cleanup(dir);

    match &result {
        Ok(()) => info!(backup_id = %id, "Restore completed"),
        Err(e) => error!(backup_id = %id, error = %e, "Restore aborted"),
    }
    result
}

/// Caller selection filtered to tracked collections, deduplicated.
pub fn working_set(ctx: &BackupContext, selected: Option<&[String]>) -> Vec<String> {
    let Some(selected) = selected.filter(|s| !s.is_empty()) else {
        return ctx.collections.clone();
    };

    let mut set: Vec<String> = Vec::new();
    for name in selected {
        let name = name.trim();
        if !ctx.is_known(name) {
            warn!(collection = %name, "Skipping unknown collection");
            continue;
        }
        if !set.iter().any(|s| s == name) {
            set.push(name.to_string());
        }
    }
    set
}

async fn run_restore(
    ctx: &BackupContext,
    id: &BackupId,
    selected: Option<&[String]>,
    dir: &Path,
) -> Result<()> {
    let metadata = get_backup_details(ctx, id)
        .await
        .ok_or_else(|| BackupError::NotFound(format!("Backup {} not found", id)))?;

    let collections = working_set(ctx, selected);
    info!(
        backup_id = %metadata.id,
        status = %metadata.status,
        collections = ?collections,
        "Starting restore"
    );

    for name in &collections {
        // The payload is fully downloaded and parsed before the live
        // collection is touched.
        let records = fetch_payload(ctx, id, name, dir).await?;
        let count = records.len();

        ctx.records.delete_all(name).await?;
        if !records.is_empty() {
            ctx.records.insert_many(name, records).await?;
        }
        info!(backup_id = %id, collection = %name, records = count, "Collection restored");
    }

    Ok(())
}

async fn fetch_payload(
    ctx: &BackupContext,
    id: &BackupId,
    collection: &str,
    dir: &Path,
) -> Result<Vec<Value>> {
    let key = id.collection_key(collection);
    let path = dir.join(format!("{}.json", collection));

    ctx.blobs.get(&key, &path).await.map_err(|e| match e {
        BackupError::NotFound(_) => {
            BackupError::NotFound(format!("Backup {} has no data for {}", id, collection))
        }
        other => other,
    })?;

    let content = tokio::fs::read(&path).await?;
    let records: Vec<Value> = serde_json::from_slice(&content)?;
    Ok(records)
}
