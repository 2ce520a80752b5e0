//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server can prepare the
//! filesystem before the storage backend opens.

use configs::{AppConfig, StorageKind};

/// Make sure the directory holding the JSON document exists when the file
/// backend is selected.
pub async fn ensure_env(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.storage.kind == StorageKind::File {
        common::env::ensure_parent_dir(&cfg.storage.file_path).await?;
    }
    Ok(())
}
