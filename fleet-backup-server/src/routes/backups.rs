use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_backup::utils::format_file_size;
use fleet_backup::{BackupId, BackupMetadata};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router(_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_backup))
        .route("/list", get(list_backups))
        .route("/{backup_id}", get(get_backup_details).delete(delete_backup))
        .route("/{backup_id}/restore", post(restore_backup))
}

#[derive(Deserialize, Default)]
pub struct CreateBackupBody {
    pub description: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct RestoreBody {
    pub collections: Option<Vec<String>>,
}

/// Metadata with human-readable sizes for the backup and each collection.
fn with_formatted_sizes(metadata: &BackupMetadata) -> Result<Value, AppError> {
    let mut value = serde_json::to_value(metadata)
        .map_err(|e| AppError::operation("Failed to encode backup", e.into()))?;
    value["formattedSize"] = json!(format_file_size(metadata.total_size));
    if let Some(collections) = value["collections"].as_array_mut() {
        for (entry, outcome) in collections.iter_mut().zip(&metadata.collections) {
            entry["formattedSize"] = json!(format_file_size(outcome.file_size));
        }
    }
    Ok(value)
}

fn parse_id(raw: &str) -> Result<BackupId, AppError> {
    BackupId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn create_backup(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateBackupBody>>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.unwrap_or_default();

    tracing::info!("Starting backup creation");
    let metadata = fleet_backup::create_backup(&state.backups, body.description)
        .await
        .map_err(|e| AppError::operation("Failed to create backup", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Backup created successfully",
        "backup": with_formatted_sizes(&metadata)?,
    })))
}

async fn list_backups(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let backups = fleet_backup::list_backups(&state.backups).await;

    let mut entries = Vec::with_capacity(backups.len());
    for backup in &backups {
        let mut entry = serde_json::to_value(backup)
            .map_err(|e| AppError::operation("Failed to list backups", e.into()))?;
        entry["collectionsCount"] = json!(backup.collections.len());
        entries.push(entry);
    }

    Ok(Json(json!({ "success": true, "backups": entries })))
}

async fn get_backup_details(
    State(state): State<Arc<AppState>>,
    Path(backup_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&backup_id)?;
    match fleet_backup::get_backup_details(&state.backups, &id).await {
        Some(details) => Ok(Json(json!({
            "success": true,
            "backup": with_formatted_sizes(&details)?,
        }))),
        None => Err(AppError::NotFound("Backup not found".into())),
    }
}

async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Path(backup_id): Path<String>,
    body: Option<Json<RestoreBody>>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&backup_id)?;
    let Json(body) = body.unwrap_or_default();

    tracing::info!(backup_id = %id, "Starting restore");
    fleet_backup::restore_from_backup(&state.backups, &id, body.collections.as_deref())
        .await
        .map_err(|e| AppError::operation("Failed to restore database", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Database restored successfully",
        "backupId": id,
    })))
}

async fn delete_backup(
    State(state): State<Arc<AppState>>,
    Path(backup_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&backup_id)?;
    let removed = fleet_backup::delete_backup(&state.backups, &id)
        .await
        .map_err(|e| AppError::operation("Failed to delete backup", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Backup deleted successfully",
        "backupId": id,
        "deletedObjects": removed,
    })))
}
