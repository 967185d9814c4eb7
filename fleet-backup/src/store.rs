//! Live record store consumed by backup and restore.
//!
//! Records are opaque JSON values; no schema is enforced at this layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::utils::errors::Result;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record currently in `collection`, in storage order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>>;

    /// Remove every record in `collection`.
    async fn delete_all(&self, collection: &str) -> Result<()>;

    /// Append `records` to `collection`.
    async fn insert_many(&self, collection: &str, records: Vec<Value>) -> Result<()>;
}
