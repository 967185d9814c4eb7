//! Utility modules for the backup subsystem.

pub mod errors;
pub mod format;
pub mod logger;
pub mod staging;

pub use errors::{BackupError, Result};
pub use format::format_file_size;
