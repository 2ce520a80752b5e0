/// Foreign-key cascade behavior of the schema
pub mod cascade_tests;

use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

use crate::db::{connect_with_config, migrate};

/// Fresh in-memory SQLite database with the full schema applied.
pub(crate) async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = connect_with_config(&DatabaseConfig::sqlite_memory()).await?;
    migrate(&db).await?;
    Ok(db)
}
