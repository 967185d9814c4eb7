//! SQLite-backed live record store. Each record is stored as JSON text
//! tagged with its collection name.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::Value;

use super::connection::DbPool;
use crate::store::RecordStore;
use crate::utils::errors::Result;

pub fn find_by_collection(conn: &Connection, collection: &str) -> Result<Vec<Value>> {
    let mut stmt = conn.prepare("SELECT body FROM records WHERE collection = ? ORDER BY id")?;
    let bodies = stmt
        .query_map(params![collection], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut records = Vec::with_capacity(bodies.len());
    for body in bodies {
        records.push(serde_json::from_str(&body)?);
    }
    Ok(records)
}

pub fn delete_by_collection(conn: &Connection, collection: &str) -> Result<usize> {
    let changes = conn.execute("DELETE FROM records WHERE collection = ?", params![collection])?;
    Ok(changes)
}

pub fn insert_batch(conn: &mut Connection, collection: &str, records: &[Value]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO records (collection, body) VALUES (?1, ?2)")?;
        for record in records {
            stmt.execute(params![collection, serde_json::to_string(record)?])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    db: DbPool,
}

impl SqliteRecordStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>> {
        let db = self.db.clone();
        let collection = collection.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get()?;
            find_by_collection(&conn, &collection)
        })
        .await?
    }

    async fn delete_all(&self, collection: &str) -> Result<()> {
        let db = self.db.clone();
        let name = collection.to_string();
        let deleted = tokio::task::spawn_blocking(move || {
            let conn = db.get()?;
            delete_by_collection(&conn, &name)
        })
        .await??;
        tracing::debug!(collection = %collection, deleted, "Cleared collection");
        Ok(())
    }

    async fn insert_many(&self, collection: &str, records: Vec<Value>) -> Result<()> {
        let db = self.db.clone();
        let name = collection.to_string();
        let inserted = tokio::task::spawn_blocking(move || {
            let mut conn = db.get()?;
            insert_batch(&mut conn, &name, &records)
        })
        .await??;
        tracing::debug!(collection = %collection, inserted, "Inserted records");
        Ok(())
    }
}
