use thiserror::Error;

/// Failures of the storage layer.
///
/// A missing entity is not an error: lookups return `Option`. Everything
/// here is surfaced to the caller as-is, never retried.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed storage document: {0}")]
    Malformed(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("session already closed")]
    SessionClosed,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(e: sea_orm::DbErr) -> Self { StorageError::Db(e.to_string()) }
}
