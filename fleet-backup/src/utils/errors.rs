//! Custom error types for the backup subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid backup id: {0:?}")]
    InvalidId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Task error: {0}")]
    Task(String),
}

impl BackupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackupError::NotFound(_))
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(e: rusqlite::Error) -> Self {
        BackupError::Database(e.to_string())
    }
}

impl From<r2d2::Error> for BackupError {
    fn from(e: r2d2::Error) -> Self {
        BackupError::Database(e.to_string())
    }
}

impl From<tokio::task::JoinError> for BackupError {
    fn from(e: tokio::task::JoinError) -> Self {
        BackupError::Task(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
