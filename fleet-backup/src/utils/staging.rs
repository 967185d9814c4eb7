//! Per-operation staging directories.
//!
//! Every backup, detail fetch and restore gets its own temporary directory
//! that is never reused. Removal failures are logged, never returned.

use std::path::Path;
use tempfile::TempDir;

/// Create a fresh staging directory under `root`.
pub fn create(root: &Path, label: &str) -> std::io::Result<TempDir> {
    std::fs::create_dir_all(root)?;
    tempfile::Builder::new()
        .prefix(&format!("fleet-backup-{}-", label))
        .tempdir_in(root)
}

/// Remove a staging directory, logging instead of failing.
pub fn cleanup(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging directory");
    }
}
