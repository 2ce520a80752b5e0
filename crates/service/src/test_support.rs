#![cfg(test)]
use configs::DatabaseConfig;

use crate::storage::DbStorage;

/// A fresh, migrated in-memory SQLite database. Each call gets its own
/// database, so tests never see each other's rows.
pub async fn get_db() -> Result<DbStorage, anyhow::Error> {
    let store = DbStorage::connect(&DatabaseConfig::sqlite_memory()).await?;
    store.migrate().await?;
    Ok(store)
}
