use std::{collections::BTreeMap, path::{Path, PathBuf}};

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::domain::{Kind, Record};
use crate::errors::StorageError;
use crate::storage::{json_map_store::JsonMapStore, Storage};

/// File-backed storage: every live entity in one map keyed by
/// `"Type.id"`, serialized as a single JSON document on `save`.
///
/// Clones share the same map, so one instance can be handed to every
/// request scope.
#[derive(Clone)]
pub struct FileStorage {
    objects: JsonMapStore<String, Record>,
}

impl FileStorage {
    /// Open the document at `path` and load whatever it holds.
    pub async fn load<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let objects = JsonMapStore::open(path).await?;
        let count = objects.count_where(|_| true).await;
        info!(path = %objects.path().display(), count, "file storage loaded");
        Ok(Self { objects })
    }

    pub fn path(&self) -> &Path {
        self.objects.path()
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn all(&self, kind: Option<&str>) -> Result<BTreeMap<String, Record>, StorageError> {
        let kinds = Kind::select(kind);
        Ok(self
            .objects
            .list()
            .await
            .into_iter()
            .filter(|(_, rec)| kinds.contains(&rec.kind()))
            .collect())
    }

    async fn new(&self, record: Record) -> Result<(), StorageError> {
        self.objects.insert(record.key(), record).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn save(&self) -> Result<(), StorageError> {
        self.objects.persist().await?;
        debug!(path = %self.objects.path().display(), "file storage saved");
        Ok(())
    }

    async fn delete(&self, record: &Record) -> Result<(), StorageError> {
        let (kind, id) = (record.kind(), record.id().to_string());
        let removed = self.objects.update_map(|map| cascade_remove(map, kind, &id)).await;
        debug!(%kind, %id, removed, "file storage delete");
        Ok(())
    }

    async fn reload(&self) -> Result<(), StorageError> {
        let count = self.objects.reload().await?;
        debug!(count, "file storage reloaded");
        Ok(())
    }

    async fn get(&self, kind: &str, id: &str) -> Result<Option<Record>, StorageError> {
        match Kind::parse(kind) {
            Some(k) => Ok(self.objects.get(&k.key(id)).await),
            None => Ok(None),
        }
    }

    async fn count(&self, kind: Option<&str>) -> Result<u64, StorageError> {
        let kinds = Kind::select(kind);
        Ok(self.objects.count_where(|rec| kinds.contains(&rec.kind())).await as u64)
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Remove `kind.id` and, recursively, everything it owns. Deleting an
/// amenity also unlinks it from every place. Returns the number of records
/// removed.
fn cascade_remove(map: &mut BTreeMap<String, Record>, kind: Kind, id: &str) -> usize {
    if map.remove(&kind.key(id)).is_none() {
        return 0;
    }

    if kind == Kind::Amenity {
        for rec in map.values_mut() {
            if let Record::Place(p) = rec {
                p.unlink_amenity(id);
            }
        }
    }

    let dependents: Vec<(Kind, String)> = map
        .values()
        .filter(|rec| rec.is_owned_by(kind, id))
        .map(|rec| (rec.kind(), rec.id().to_string()))
        .collect();

    1 + dependents
        .iter()
        .map(|(k, dep)| cascade_remove(map, *k, dep))
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amenity, City, Place, Review, State, User};
    use uuid::Uuid;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir().join(format!("hbnb_file_storage_{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn new_get_count_without_saving() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let store = FileStorage::load(&path).await?;
        let state = State::new("New York");
        store.new(state.clone().into()).await?;

        assert_eq!(store.get("State", &state.id).await?, Some(Record::State(state.clone())));
        assert_eq!(store.get("State", "blah").await?, None);
        assert_eq!(store.get("Blah", &state.id).await?, None);
        assert_eq!(store.count(Some("State")).await?, 1);
        assert_eq!(store.count(Some("Blah")).await?, 0);
        assert!(store.all(Some("Blah")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_then_reload_round_trips() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let store = FileStorage::load(&path).await?;

        let state = State::new("California");
        let city = City::new(&state.id, "San Francisco");
        let user = User::new("bob@foobar.com", "password")?;
        let mut place = Place::new(&city.id, &user.id, "Loft");
        let wifi = Amenity::new("Wifi");
        place.link_amenity(&wifi.id);
        place.latitude = Some(37.77);
        let review = Review::new(&place.id, &user.id, "Lovely");
        for rec in [
            Record::from(state),
            city.into(),
            user.into(),
            place.into(),
            wifi.into(),
            review.into(),
        ] {
            store.new(rec).await?;
        }
        store.save().await?;
        let before = store.all(None).await?;

        let reopened = FileStorage::load(&path).await?;
        let after = reopened.all(None).await?;
        assert_eq!(before, after);
        assert_eq!(after.len(), 6);

        // the document is keyed by composite keys and tagged by type
        let raw: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        for (key, rec) in &after {
            assert_eq!(raw[key]["__class__"], rec.kind().as_str());
        }

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn count_without_filter_is_sum_of_kinds() -> Result<(), anyhow::Error> {
        let store = FileStorage::load(tmp_path()).await?;
        let state = State::new("Texas");
        store.new(City::new(&state.id, "Austin").into()).await?;
        store.new(state.into()).await?;
        store.new(Amenity::new("Pool").into()).await?;

        let mut sum = 0;
        for kind in Kind::ALL {
            sum += store.count(Some(kind.as_str())).await?;
        }
        assert_eq!(store.count(None).await?, sum);
        assert_eq!(sum, 3);
        Ok(())
    }

    #[tokio::test]
    async fn delete_cascades_like_the_schema() -> Result<(), anyhow::Error> {
        let store = FileStorage::load(tmp_path()).await?;
        let state = State::new("Florida");
        let city = City::new(&state.id, "Miami");
        let owner = User::new("owner@example.com", "pwd")?;
        let guest = User::new("guest@example.com", "pwd")?;
        let mut place = Place::new(&city.id, &owner.id, "Condo");
        let pool = Amenity::new("Pool");
        place.link_amenity(&pool.id);
        let guest_review = Review::new(&place.id, &guest.id, "Nice");
        for rec in [
            Record::from(state.clone()),
            city.clone().into(),
            owner.clone().into(),
            guest.clone().into(),
            place.clone().into(),
            pool.clone().into(),
            guest_review.into(),
        ] {
            store.new(rec).await?;
        }

        store.delete(&Record::from(pool)).await?;
        match store.get("Place", &place.id).await? {
            Some(Record::Place(p)) => assert!(p.amenity_ids.is_empty()),
            other => panic!("place missing: {other:?}"),
        }

        store.delete(&Record::from(owner)).await?;
        assert_eq!(store.count(Some("Place")).await?, 0);
        assert_eq!(store.count(Some("Review")).await?, 0);
        assert_eq!(store.count(Some("User")).await?, 1);

        store.delete(&Record::from(state)).await?;
        assert_eq!(store.count(Some("City")).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_document_fails_to_load() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        tokio::fs::write(&path, br#"{"State.1": {"__class__": "Nope"}}"#).await?;
        assert!(matches!(FileStorage::load(&path).await, Err(StorageError::Malformed(_))));
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_to_unwritable_location_is_io_error() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let store = FileStorage::load(&path).await?;
        // a directory squatting on the document path cannot be overwritten
        tokio::fs::create_dir_all(&path).await?;
        store.new(State::new("Nevada").into()).await?;
        assert!(matches!(store.save().await, Err(StorageError::Io(_))));
        let _ = tokio::fs::remove_dir_all(&path).await;
        Ok(())
    }
}
