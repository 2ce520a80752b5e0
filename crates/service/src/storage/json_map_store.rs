use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::RwLock};

use crate::errors::StorageError;

/// Generic JSON file-backed key-value map.
///
/// Mutations only touch memory; `persist` writes the whole map to disk,
/// overwriting the previous document. Keys are ordered so the document is
/// stable between saves. Clones share the same map.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<BTreeMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Ord + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`, loading the document if it exists.
    /// A missing file yields an empty map; it is created on first `persist`.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let file_path = path.into();
        let map = read_document(&file_path).await?;
        Ok(Self { inner: Arc::new(RwLock::new(map)), file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Replace the in-memory map with the document on disk.
    pub async fn reload(&self) -> Result<usize, StorageError> {
        let map = read_document(&self.file_path).await?;
        let len = map.len();
        *self.inner.write().await = map;
        Ok(len)
    }

    /// Serialize the whole map to the backing file.
    pub async fn persist(&self) -> Result<(), StorageError> {
        let data = {
            let map = self.inner.read().await;
            serde_json::to_vec(&*map).map_err(|e| StorageError::Malformed(e.to_string()))?
        };
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
        }
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", self.file_path.display())))
    }

    /// List all entries as `(key, value)` pairs, in key order.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or replace a value in memory.
    pub async fn insert(&self, key: K, value: V) {
        self.inner.write().await.insert(key, value);
    }

    /// Count values matching a predicate without cloning them.
    pub async fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&V) -> bool,
    {
        self.inner.read().await.values().filter(|v| pred(v)).count()
    }

    /// Apply a mutation to the in-memory map under a single write lock.
    pub async fn update_map<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BTreeMap<K, V>) -> R,
    {
        let mut map = self.inner.write().await;
        f(&mut map)
    }
}

async fn read_document<K, V>(path: &Path) -> Result<BTreeMap<K, V>, StorageError>
where
    K: Ord + serde::de::DeserializeOwned,
    V: serde::de::DeserializeOwned,
{
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Malformed(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(StorageError::Io(format!("{}: {e}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_persists_only_on_demand() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonMapStore::<String, String>::open(&tmp).await?;

        // initially empty, and nothing written yet
        assert_eq!(store.list().await.len(), 0);
        assert!(tokio::fs::metadata(&tmp).await.is_err());

        store.insert("a".into(), "1".into()).await;
        store.insert("b".into(), "2".into()).await;
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));
        assert_eq!(store.count_where(|v| v == "2").await, 1);

        // unsaved changes are invisible to a second reader
        let other = JsonMapStore::<String, String>::open(&tmp).await?;
        assert_eq!(other.list().await.len(), 0);

        store.persist().await?;
        store
            .update_map(|m| {
                m.insert("a".into(), "10".into());
            })
            .await;
        store
            .update_map(|m| {
                m.remove("b");
            })
            .await;

        // reload discards in-memory edits made after the last persist
        assert_eq!(store.reload().await?, 2);
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_document_is_an_error() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_bad_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"{not json").await?;
        let res = JsonMapStore::<String, String>::open(&tmp).await;
        assert!(matches!(res, Err(StorageError::Malformed(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
