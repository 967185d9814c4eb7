use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_backup::BackupError;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}: {source}")]
    Operation {
        message: &'static str,
        #[source]
        source: BackupError,
    },
}

impl AppError {
    /// Classify a core failure: missing backups become 404, malformed ids
    /// 400, everything else a 500 labelled with `message`.
    pub fn operation(message: &'static str, source: BackupError) -> Self {
        match source {
            BackupError::NotFound(m) => AppError::NotFound(m),
            BackupError::InvalidId(_) => AppError::BadRequest(source.to_string()),
            source => AppError::Operation { message, source },
        }
    }
}

impl From<BackupError> for AppError {
    fn from(e: BackupError) -> Self {
        AppError::operation("Backup operation failed", e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": m }),
            ),
            AppError::BadRequest(m) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": m }),
            ),
            AppError::Operation { message, source } => {
                tracing::error!("{message}: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": message, "error": source.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
