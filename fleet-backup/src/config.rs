//! Configuration management for the backup subsystem.
//!
//! Loads configuration from a TOML file, or from defaults with environment
//! variable overrides (a `.env` file is honoured).

use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Collections of the fleet data store tracked by default.
pub const DEFAULT_COLLECTIONS: &[&str] = &["Cab", "Customer", "Driver", "Ride"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    Local,
    Gcs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object storage implementation
    #[serde(default = "default_backend")]
    pub backend: BlobBackend,

    /// Directory acting as the bucket for the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// GCS bucket name
    #[serde(default)]
    pub bucket: String,

    /// OAuth2 bearer token for the GCS JSON API
    #[serde(default)]
    pub access_token: Option<String>,

    /// GCS endpoint (override for emulators)
    #[serde(default = "default_gcs_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the live collections
    pub path: PathBuf,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Collections included in every backup and restore
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,

    /// Parent directory for per-operation staging directories
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_backend() -> BlobBackend {
    BlobBackend::Local
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}

fn default_gcs_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_collections() -> Vec<String> {
    DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect()
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            collections: default_collections(),
            staging_dir: default_staging_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                backend: default_backend(),
                local_root: default_local_root(),
                bucket: String::new(),
                access_token: None,
                endpoint: default_gcs_endpoint(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("./data/fleet.db"),
                pool_size: default_pool_size(),
            },
            backup: BackupConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| BackupError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults and environment variables
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let config = Self::default().with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(backend) = var("BLOB_BACKEND") {
            self.storage.backend = match backend.to_lowercase().as_str() {
                "local" => BlobBackend::Local,
                "gcs" => BlobBackend::Gcs,
                other => {
                    return Err(BackupError::Config(format!("Unknown blob backend: {}", other)))
                }
            };
        }
        if let Some(root) = var("BLOB_LOCAL_ROOT") {
            self.storage.local_root = PathBuf::from(root);
        }
        if let Some(bucket) = var("GCS_BUCKET_NAME") {
            self.storage.bucket = bucket;
        }
        if let Some(token) = var("GCS_ACCESS_TOKEN") {
            self.storage.access_token = Some(token);
        }
        if let Some(endpoint) = var("GCS_ENDPOINT") {
            self.storage.endpoint = endpoint;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(collections) = var("BACKUP_COLLECTIONS") {
            self.backup.collections = collections
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(dir) = var("BACKUP_STAGING_DIR") {
            self.backup.staging_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == BlobBackend::Gcs && self.storage.bucket.is_empty() {
            return Err(BackupError::Config("No bucket name provided".into()));
        }
        validate_collections(&self.backup.collections)
    }
}

/// Collection names become object keys `backups/<id>/<name>.json` and staging
/// file names, so each must be a plain, distinct file stem that cannot clash
/// with `metadata.json`.
pub fn validate_collections(collections: &[String]) -> Result<()> {
    if collections.is_empty() {
        return Err(BackupError::Config("At least one collection is required".into()));
    }
    let mut seen = HashSet::new();
    for name in collections {
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name.trim() == name;
        if !plain || name == "metadata" {
            return Err(BackupError::Config(format!("Invalid collection name: {:?}", name)));
        }
        if !seen.insert(name) {
            return Err(BackupError::Config(format!("Duplicate collection: {}", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_track_fleet_collections() {
        let config = Config::default();
        assert_eq!(config.backup.collections, vec!["Cab", "Customer", "Driver", "Ride"]);
        assert_eq!(config.storage.backend, BlobBackend::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(vars(&[
                ("BLOB_BACKEND", "gcs"),
                ("GCS_BUCKET_NAME", "fleet-backups"),
                ("BACKUP_COLLECTIONS", "Cab, Ride"),
                ("DATABASE_PATH", "/tmp/fleet.db"),
            ]))
            .unwrap();

        assert_eq!(config.storage.backend, BlobBackend::Gcs);
        assert_eq!(config.storage.bucket, "fleet-backups");
        assert_eq!(config.backup.collections, vec!["Cab", "Ride"]);
        assert_eq!(config.database.path, PathBuf::from("/tmp/fleet.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Config::default().with_overrides(vars(&[("BLOB_BACKEND", "ftp")]));
        assert!(matches!(result, Err(BackupError::Config(_))));
    }

    #[test]
    fn test_gcs_requires_bucket() {
        let mut config = Config::default();
        config.storage.backend = BlobBackend::Gcs;
        assert!(matches!(config.validate(), Err(BackupError::Config(_))));
    }

    #[test]
    fn test_duplicate_collections_rejected() {
        let mut config = Config::default();
        config.backup.collections = vec!["Cab".into(), "Cab".into()];
        assert!(matches!(config.validate(), Err(BackupError::Config(_))));

        config.backup.collections = vec!["metadata".into()];
        assert!(matches!(config.validate(), Err(BackupError::Config(_))));
    }

    #[test]
    fn test_collection_names_must_be_plain() {
        for bad in ["", "..", ".hidden", "a/b", "a\\b", " Cab", "metadata"] {
            let names = vec!["Cab".to_string(), bad.to_string()];
            assert!(
                matches!(validate_collections(&names), Err(BackupError::Config(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(validate_collections(&[]).is_err());
        assert!(validate_collections(&["Cab".into(), "Ride_2024".into(), "metadata-v2".into()]).is_ok());
    }

    #[test]
    fn test_empty_name_in_file_rejected() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[database]
path = "/srv/fleet.db"

[storage]

[backup]
collections = ["Cab", ""]
"#
        )?;

        assert!(matches!(Config::from_file(file.path()), Err(BackupError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_from_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[storage]
backend = "local"
local_root = "/srv/blobs"

[database]
path = "/srv/fleet.db"

[backup]
collections = ["Driver"]
"#
        )?;

        let config = Config::from_file(file.path())?;
        assert_eq!(config.storage.local_root, PathBuf::from("/srv/blobs"));
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.backup.collections, vec!["Driver"]);
        assert_eq!(config.log.level, "info");
        Ok(())
    }
}
