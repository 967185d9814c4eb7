//! Snapshot writer: serializes every tracked collection, uploads it and
//! records the outcome, then publishes the backup metadata.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::path::Path;
use tracing::{error, info};

use super::BackupContext;
use crate::models::backup::METADATA_OBJECT;
use crate::models::{BackupId, BackupMetadata, CollectionOutcome};
use crate::utils::errors::Result;
use crate::utils::staging;

/// Snapshot all tracked collections into a new backup.
///
/// A failure in one collection is recorded in its outcome and never stops
/// the others. The live store is only read. Fails only if the staging
/// directory cannot be created or the metadata cannot be published.
pub async fn create_backup(
    ctx: &BackupContext,
    description: Option<String>,
) -> Result<BackupMetadata> {
    let timestamp = Utc::now();
    let id = BackupId::from_time(timestamp);

    info!(
        backup_id = %id,
        collections = ctx.collections.len(),
        "Starting backup"
    );

    let dir = staging::create(&ctx.staging_dir, "backup")?;
    let result = write_snapshot(ctx, id, timestamp, description, dir.path()).await;
    staging::cleanup(dir);
    result
}

async fn write_snapshot(
    ctx: &BackupContext,
    id: BackupId,
    timestamp: DateTime<Utc>,
    description: Option<String>,
    dir: &Path,
) -> Result<BackupMetadata> {
    // Collections are independent; outcomes keep the configured order.
    let outcomes = join_all(
        ctx.collections
            .iter()
            .map(|name| backup_collection(ctx, &id, name, dir)),
    )
    .await;

    let metadata = BackupMetadata::assemble(id, timestamp, outcomes, description);

    let path = dir.join(METADATA_OBJECT);
    tokio::fs::write(&path, serde_json::to_vec_pretty(&metadata)?).await?;
    ctx.blobs.put(&path, &metadata.id.metadata_key()).await?;

    info!(
        backup_id = %metadata.id,
        status = %metadata.status,
        total_size = metadata.total_size,
        "Backup finished"
    );
    Ok(metadata)
}

async fn backup_collection(
    ctx: &BackupContext,
    id: &BackupId,
    name: &str,
    dir: &Path,
) -> CollectionOutcome {
    match snapshot_collection(ctx, id, name, dir).await {
        Ok((record_count, file_size)) => {
            info!(backup_id = %id, collection = %name, record_count, file_size, "Collection backed up");
            CollectionOutcome::success(name, record_count, file_size)
        }
        Err(e) => {
            error!(backup_id = %id, collection = %name, error = %e, "Collection backup failed");
            CollectionOutcome::failed(name, e)
        }
    }
}

/// Returns `(record_count, file_size)`.
async fn snapshot_collection(
    ctx: &BackupContext,
    id: &BackupId,
    name: &str,
    dir: &Path,
) -> Result<(u64, u64)> {
    let records = ctx.records.find_all(name).await?;
    let body = serde_json::to_vec_pretty(&records)?;

    let path = dir.join(format!("{}.json", name));
    tokio::fs::write(&path, &body).await?;
    let file_size = tokio::fs::metadata(&path).await?.len();

    ctx.blobs.put(&path, &id.collection_key(name)).await?;
    Ok((records.len() as u64, file_size))
}
