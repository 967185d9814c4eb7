//! Retention: removes every object belonging to a backup.

use tracing::info;

use super::BackupContext;
use crate::models::BackupId;
use crate::utils::errors::Result;

/// Delete every object under `backups/<id>/`. Returns the number of objects
/// removed; an unknown id removes nothing and succeeds. The first failed
/// delete aborts the operation.
pub async fn delete_backup(ctx: &BackupContext, id: &BackupId) -> Result<usize> {
    let entries = ctx.blobs.list(&id.prefix()).await?;

    for entry in &entries {
        ctx.blobs.delete(&entry.name).await?;
    }

    info!(backup_id = %id, objects = entries.len(), "Backup deleted");
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::list_backups;
    use crate::services::testing::fixture;
    use crate::utils::errors::BackupError;

    #[tokio::test]
    async fn test_delete_removes_only_that_backup() -> Result<()> {
        let fx = fixture(&["Cab"]);
        fx.blobs.insert("backups/backup-1/Cab.json", b"[]");
        fx.blobs.insert("backups/backup-1/metadata.json", b"{}");
        fx.blobs.insert("backups/backup-10/Cab.json", b"[]");
        fx.blobs.insert("backups/backup-2/Cab.json", b"[]");

        let removed = delete_backup(&fx.ctx, &BackupId::parse("backup-1")?).await?;

        assert_eq!(removed, 2);
        assert_eq!(
            fx.blobs.keys(),
            vec!["backups/backup-10/Cab.json", "backups/backup-2/Cab.json"]
        );
        let ids: Vec<String> = list_backups(&fx.ctx)
            .await
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert!(!ids.contains(&"backup-1".to_string()));
        assert_eq!(ids.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_is_noop() -> Result<()> {
        let fx = fixture(&["Cab"]);
        fx.blobs.insert("backups/backup-1/Cab.json", b"[]");

        let removed = delete_backup(&fx.ctx, &BackupId::parse("backup-404")?).await?;

        assert_eq!(removed, 0);
        assert_eq!(fx.blobs.keys().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_failure_propagates() -> Result<()> {
        let fx = fixture(&["Cab"]);
        fx.blobs.insert("backups/backup-1/Cab.json", b"[]");
        fx.blobs.fail_deletes();

        let result = delete_backup(&fx.ctx, &BackupId::parse("backup-1")?).await;

        assert!(matches!(result, Err(BackupError::Storage(_))));
        Ok(())
    }
}
