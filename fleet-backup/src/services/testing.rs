//! In-memory collaborators with failure injection for service tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::BackupContext;
use crate::blob::{BlobEntry, BlobStore};
use crate::store::RecordStore;
use crate::utils::errors::{BackupError, Result};

#[derive(Default)]
pub struct MemoryRecordStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    failing_reads: Mutex<HashSet<String>>,
}

impl MemoryRecordStore {
    pub fn seed(&self, collection: &str, records: Vec<Value>) {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), records);
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_reads_of(&self, collection: &str) {
        self.failing_reads.lock().unwrap().insert(collection.to_string());
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>> {
        if self.failing_reads.lock().unwrap().contains(collection) {
            return Err(BackupError::Database(format!("read of {} failed", collection)));
        }
        Ok(self.records(collection))
    }

    async fn delete_all(&self, collection: &str) -> Result<()> {
        self.collections.lock().unwrap().remove(collection);
        Ok(())
    }

    async fn insert_many(&self, collection: &str, records: Vec<Value>) -> Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(records);
        Ok(())
    }
}

/// Object store keeping bodies in memory. Each write is stamped one second
/// after the previous one so listings are deterministic.
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
    clock: Mutex<DateTime<Utc>>,
    failing_puts: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            clock: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            failing_puts: Mutex::new(HashSet::new()),
            fail_list: Mutex::new(false),
            fail_delete: Mutex::new(false),
        }
    }
}

impl MemoryBlobStore {
    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap();
        *clock += Duration::seconds(1);
        *clock
    }

    pub fn insert(&self, key: &str, body: &[u8]) {
        let at = self.tick();
        self.insert_at(key, body, at);
    }

    pub fn insert_at(&self, key: &str, body: &[u8], at: DateTime<Utc>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body.to_vec(), at));
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|(b, _)| b.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Reject uploads of any key ending with `suffix`.
    pub fn fail_puts_ending_with(&self, suffix: &str) {
        self.failing_puts.lock().unwrap().insert(suffix.to_string());
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn fail_deletes(&self) {
        *self.fail_delete.lock().unwrap() = true;
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, local: &Path, key: &str) -> Result<()> {
        if self.failing_puts.lock().unwrap().iter().any(|s| key.ends_with(s.as_str())) {
            return Err(BackupError::Storage(format!("upload of {} rejected", key)));
        }
        let body = tokio::fs::read(local).await?;
        self.insert(key, &body);
        Ok(())
    }

    async fn get(&self, key: &str, local: &Path) -> Result<()> {
        let body = self
            .body(key)
            .ok_or_else(|| BackupError::NotFound(key.to_string()))?;
        tokio::fs::write(local, body).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        if *self.fail_list.lock().unwrap() {
            return Err(BackupError::Storage("listing unavailable".into()));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, (_, at))| BlobEntry {
                name: name.clone(),
                created_at: *at,
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if *self.fail_delete.lock().unwrap() {
            return Err(BackupError::Storage(format!("delete of {} rejected", key)));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct Fixture {
    pub records: Arc<MemoryRecordStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub ctx: BackupContext,
    pub staging: TempDir,
}

pub fn fixture(collections: &[&str]) -> Fixture {
    let records = Arc::new(MemoryRecordStore::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let staging = TempDir::new().unwrap();
    let ctx = BackupContext::new(
        records.clone(),
        blobs.clone(),
        collections.iter().map(|c| c.to_string()).collect(),
        staging.path().to_path_buf(),
    )
    .unwrap();
    Fixture {
        records,
        blobs,
        ctx,
        staging,
    }
}

impl Fixture {
    /// True once every per-operation staging directory has been removed.
    pub fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(self.staging.path()).unwrap().next().is_none()
    }
}
