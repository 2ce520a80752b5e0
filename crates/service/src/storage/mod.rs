//! Storage backends.
//!
//! Both backends implement [`Storage`]: the file backend keeps every object
//! in one JSON document, the database backend maps objects onto tables.
//! Callers obtain a handle with [`Backend::open`], use it for one request
//! and `close` it afterwards.

pub mod db;
pub mod file;
pub mod json_map_store;
mod mapping;

use std::collections::BTreeMap;

use async_trait::async_trait;
use configs::{AppConfig, StorageKind};
use tracing::info;

use crate::domain::Record;
use crate::errors::StorageError;

pub use db::{DbSession, DbStorage};
pub use file::FileStorage;

/// The persistence contract shared by every backend.
///
/// Type filters are entity type names (`"State"`, `"Place"`, ...). An
/// unknown name is not an error: it matches nothing.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every live object of the given type (or of all types), keyed by
    /// `"Type.id"`.
    async fn all(&self, kind: Option<&str>) -> Result<BTreeMap<String, Record>, StorageError>;

    /// Register a new or modified object. Not durable until `save`.
    async fn new(&self, record: Record) -> Result<(), StorageError>;

    /// Make every pending change durable.
    async fn save(&self) -> Result<(), StorageError>;

    /// Remove an object (and everything it owns). Not durable until `save`.
    async fn delete(&self, record: &Record) -> Result<(), StorageError>;

    /// Discard pending changes and re-read durable state.
    async fn reload(&self) -> Result<(), StorageError>;

    async fn get(&self, kind: &str, id: &str) -> Result<Option<Record>, StorageError>;

    async fn count(&self, kind: Option<&str>) -> Result<u64, StorageError>;

    /// End the unit of work.
    async fn close(&self) -> Result<(), StorageError>;
}

/// The backend selected at startup.
#[derive(Clone)]
pub enum Backend {
    File(FileStorage),
    Db(DbStorage),
}

impl Backend {
    /// Build the backend named by the configuration. The database backend
    /// connects and brings the schema up to date before returning.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, StorageError> {
        match cfg.storage.kind {
            StorageKind::File => {
                let fs = FileStorage::load(&cfg.storage.file_path).await?;
                Ok(Backend::File(fs))
            }
            StorageKind::Db => {
                let db = DbStorage::connect(&cfg.database).await?;
                db.migrate().await?;
                Ok(Backend::Db(db))
            }
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Backend::File(_) => StorageKind::File,
            Backend::Db(_) => StorageKind::Db,
        }
    }

    /// A storage handle for one unit of work.
    pub fn open(&self) -> Box<dyn Storage> {
        match self {
            Backend::File(fs) => Box::new(fs.clone()),
            Backend::Db(db) => Box::new(db.open()),
        }
    }

    pub fn describe(&self) {
        match self {
            Backend::File(fs) => info!(path = %fs.path().display(), "using file storage"),
            Backend::Db(db) => info!(backend = ?sea_orm::ConnectionTrait::get_database_backend(db.connection()), "using database storage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::State;

    #[tokio::test]
    async fn backends_share_one_contract() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("hbnb_backend_{}.json", uuid::Uuid::new_v4()));
        let file = Backend::File(FileStorage::load(&path).await?);
        let db = Backend::Db(crate::test_support::get_db().await?);

        for backend in [file, db] {
            let state = State::new("Maine");
            let store = backend.open();
            store.new(state.clone().into()).await?;
            store.save().await?;
            store.close().await?;

            let store = backend.open();
            assert_eq!(store.get("State", &state.id).await?, Some(Record::State(state.clone())));
            assert_eq!(store.count(Some("State")).await?, 1);
            store.delete(&Record::from(state)).await?;
            store.save().await?;
            assert_eq!(store.count(None).await?, 0);
            store.close().await?;
        }

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn from_config_picks_file_backend_by_default() -> Result<(), anyhow::Error> {
        let mut cfg = AppConfig::default();
        cfg.storage.file_path = std::env::temp_dir()
            .join(format!("hbnb_cfg_{}.json", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        let backend = Backend::from_config(&cfg).await?;
        assert_eq!(backend.kind(), StorageKind::File);
        Ok(())
    }
}
