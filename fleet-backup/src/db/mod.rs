pub mod connection;
pub mod migrate;
pub mod records;

pub use records::SqliteRecordStore;

use crate::config::DatabaseConfig;
use crate::utils::errors::Result;

/// Open the live store described by `config`, applying the schema.
pub fn open(config: &DatabaseConfig) -> Result<SqliteRecordStore> {
    let pool = connection::create_pool(&config.path, config.pool_size)?;
    migrate::migrate(&pool)?;
    Ok(SqliteRecordStore::new(pool))
}
