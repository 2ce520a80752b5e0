use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use configs::DatabaseConfig;
use models::{amenity, city, place, place_amenity, review, state, user};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Kind, Record};
use crate::errors::StorageError;
use crate::storage::{mapping, Storage};

/// Relational storage over a SeaORM connection pool.
///
/// The pool is shared; all reads and writes go through a [`DbSession`]
/// obtained from [`DbStorage::open`].
#[derive(Clone)]
pub struct DbStorage {
    db: DatabaseConnection,
}

impl DbStorage {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, StorageError> {
        let db = models::db::connect_with_config(cfg).await?;
        Ok(Self { db })
    }

    /// Create every table that does not exist yet.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        models::db::migrate(&self.db).await?;
        info!("database schema up to date");
        Ok(())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Start a unit of work.
    pub fn open(&self) -> DbSession {
        DbSession { db: self.db.clone(), staged: Mutex::new(Vec::new()), closed: Mutex::new(false) }
    }
}

#[derive(Debug)]
enum Staged {
    Upsert(Record),
    Delete { kind: Kind, id: String },
}

/// One unit of work against the database.
///
/// `new` and `delete` only stage changes; `save` applies them in a single
/// transaction. Reads see committed rows only. `close` (or dropping the
/// session) discards whatever is still staged.
pub struct DbSession {
    db: DatabaseConnection,
    staged: Mutex<Vec<Staged>>,
    closed: Mutex<bool>,
}

impl DbSession {
    async fn stage(&self, op: Staged) -> Result<(), StorageError> {
        if *self.closed.lock().await {
            return Err(StorageError::SessionClosed);
        }
        self.staged.lock().await.push(op);
        Ok(())
    }

    async fn fetch_one(&self, kind: Kind, id: &str) -> Result<Option<Record>, StorageError> {
        let db = &self.db;
        let id = id.to_string();
        let rec = match kind {
            Kind::State => state::Entity::find_by_id(id).one(db).await?.map(|m| Record::State(m.into())),
            Kind::City => city::Entity::find_by_id(id).one(db).await?.map(|m| Record::City(m.into())),
            Kind::User => user::Entity::find_by_id(id).one(db).await?.map(|m| Record::User(m.into())),
            Kind::Amenity => amenity::Entity::find_by_id(id).one(db).await?.map(|m| Record::Amenity(m.into())),
            Kind::Review => review::Entity::find_by_id(id).one(db).await?.map(|m| Record::Review(m.into())),
            Kind::Place => match place::Entity::find_by_id(id).one(db).await? {
                Some(m) => {
                    let ids = self.amenity_ids_of(&m.id).await?;
                    Some(Record::Place(mapping::place_from_row(m, ids)))
                }
                None => None,
            },
        };
        Ok(rec)
    }

    async fn fetch_all(&self, kind: Kind) -> Result<Vec<Record>, StorageError> {
        let db = &self.db;
        let recs = match kind {
            Kind::State => state::Entity::find().all(db).await?.into_iter().map(|m| Record::State(m.into())).collect(),
            Kind::City => city::Entity::find().all(db).await?.into_iter().map(|m| Record::City(m.into())).collect(),
            Kind::User => user::Entity::find().all(db).await?.into_iter().map(|m| Record::User(m.into())).collect(),
            Kind::Amenity => {
                amenity::Entity::find().all(db).await?.into_iter().map(|m| Record::Amenity(m.into())).collect()
            }
            Kind::Review => {
                review::Entity::find().all(db).await?.into_iter().map(|m| Record::Review(m.into())).collect()
            }
            Kind::Place => {
                let mut links: HashMap<String, Vec<String>> = HashMap::new();
                for link in place_amenity::Entity::find().all(db).await? {
                    links.entry(link.place_id).or_default().push(link.amenity_id);
                }
                place::Entity::find()
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|m| {
                        let mut ids = links.remove(&m.id).unwrap_or_default();
                        ids.sort();
                        Record::Place(mapping::place_from_row(m, ids))
                    })
                    .collect()
            }
        };
        Ok(recs)
    }

    async fn amenity_ids_of(&self, place_id: &str) -> Result<Vec<String>, StorageError> {
        let mut ids: Vec<String> = place_amenity::Entity::find()
            .filter(place_amenity::Column::PlaceId.eq(place_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| l.amenity_id)
            .collect();
        // collation order differs between backends
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl Storage for DbSession {
    async fn all(&self, kind: Option<&str>) -> Result<BTreeMap<String, Record>, StorageError> {
        let mut out = BTreeMap::new();
        for k in Kind::select(kind) {
            for rec in self.fetch_all(k).await? {
                out.insert(rec.key(), rec);
            }
        }
        Ok(out)
    }

    async fn new(&self, record: Record) -> Result<(), StorageError> {
        self.stage(Staged::Upsert(record)).await
    }

    #[instrument(skip(self))]
    async fn save(&self) -> Result<(), StorageError> {
        if *self.closed.lock().await {
            return Err(StorageError::SessionClosed);
        }
        let ops = std::mem::take(&mut *self.staged.lock().await);
        if ops.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await?;
        let n = ops.len();
        for op in &ops {
            let res = match op {
                Staged::Upsert(rec) => apply_upsert(&txn, rec).await,
                Staged::Delete { kind, id } => apply_delete(&txn, *kind, id).await.map(|_| ()),
            };
            if let Err(e) = res {
                warn!(error = %e, "commit failed, rolling back");
                if let Err(rb) = txn.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                return Err(e.into());
            }
        }
        txn.commit().await?;
        debug!(ops = n, "database session committed");
        Ok(())
    }

    async fn delete(&self, record: &Record) -> Result<(), StorageError> {
        self.stage(Staged::Delete { kind: record.kind(), id: record.id().to_string() }).await
    }

    async fn reload(&self) -> Result<(), StorageError> {
        let dropped = std::mem::take(&mut *self.staged.lock().await).len();
        debug!(dropped, "database session reloaded");
        Ok(())
    }

    async fn get(&self, kind: &str, id: &str) -> Result<Option<Record>, StorageError> {
        match Kind::parse(kind) {
            Some(k) => self.fetch_one(k, id).await,
            None => Ok(None),
        }
    }

    async fn count(&self, kind: Option<&str>) -> Result<u64, StorageError> {
        let db = &self.db;
        let mut total = 0;
        for k in Kind::select(kind) {
            total += match k {
                Kind::State => state::Entity::find().count(db).await?,
                Kind::City => city::Entity::find().count(db).await?,
                Kind::User => user::Entity::find().count(db).await?,
                Kind::Amenity => amenity::Entity::find().count(db).await?,
                Kind::Place => place::Entity::find().count(db).await?,
                Kind::Review => review::Entity::find().count(db).await?,
            };
        }
        Ok(total)
    }

    async fn close(&self) -> Result<(), StorageError> {
        let dropped = std::mem::take(&mut *self.staged.lock().await).len();
        if dropped > 0 {
            debug!(dropped, "discarding uncommitted changes");
        }
        *self.closed.lock().await = true;
        Ok(())
    }
}

impl Drop for DbSession {
    fn drop(&mut self) {
        let pending = self.staged.get_mut().len();
        if pending > 0 {
            warn!(pending, "database session dropped with uncommitted changes");
        }
    }
}

async fn apply_upsert(txn: &DatabaseTransaction, record: &Record) -> Result<(), DbErr> {
    match record {
        Record::State(s) => {
            let exists = state::Entity::find_by_id(s.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::state_row(s), exists).await
        }
        Record::City(c) => {
            let exists = city::Entity::find_by_id(c.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::city_row(c), exists).await
        }
        Record::User(u) => {
            let exists = user::Entity::find_by_id(u.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::user_row(u), exists).await
        }
        Record::Amenity(a) => {
            let exists = amenity::Entity::find_by_id(a.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::amenity_row(a), exists).await
        }
        Record::Review(r) => {
            let exists = review::Entity::find_by_id(r.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::review_row(r), exists).await
        }
        Record::Place(p) => {
            let exists = place::Entity::find_by_id(p.id.clone()).one(txn).await?.is_some();
            write_row(txn, mapping::place_row(p), exists).await?;
            // junction rows mirror amenity_ids exactly
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::PlaceId.eq(p.id.as_str()))
                .exec(txn)
                .await?;
            let links = mapping::place_amenity_rows(p);
            if !links.is_empty() {
                place_amenity::Entity::insert_many(links).exec_without_returning(txn).await?;
            }
            Ok(())
        }
    }
}

async fn write_row<A>(txn: &DatabaseTransaction, row: A, exists: bool) -> Result<(), DbErr>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    if exists {
        row.update(txn).await?;
    } else {
        row.insert(txn).await?;
    }
    Ok(())
}

async fn apply_delete(txn: &DatabaseTransaction, kind: Kind, id: &str) -> Result<u64, DbErr> {
    let id = id.to_string();
    let res = match kind {
        Kind::State => state::Entity::delete_by_id(id).exec(txn).await?,
        Kind::City => city::Entity::delete_by_id(id).exec(txn).await?,
        Kind::User => user::Entity::delete_by_id(id).exec(txn).await?,
        Kind::Amenity => amenity::Entity::delete_by_id(id).exec(txn).await?,
        Kind::Place => place::Entity::delete_by_id(id).exec(txn).await?,
        Kind::Review => review::Entity::delete_by_id(id).exec(txn).await?,
    };
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amenity, City, Place, Review, State, User};
    use crate::test_support::get_db;

    #[tokio::test]
    async fn get_after_save_returns_equal_entity() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let state = State::new("California");
        let user = User::new("bob@example.com", "secret")?;

        let s = store.open();
        s.new(state.clone().into()).await?;
        s.new(user.clone().into()).await?;
        s.save().await?;
        s.close().await?;

        let s = store.open();
        assert_eq!(s.get("State", &state.id).await?, Some(Record::State(state.clone())));
        assert_eq!(s.get("User", &user.id).await?, Some(Record::User(user)));
        assert_eq!(s.get("State", "missing").await?, None);
        assert_eq!(s.get("Blah", &state.id).await?, None);
        assert_eq!(s.count(Some("Blah")).await?, 0);
        assert!(s.all(Some("Blah")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn staged_changes_are_invisible_and_discarded_on_close() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let s = store.open();
        s.new(State::new("Ohio").into()).await?;
        assert_eq!(s.count(Some("State")).await?, 0);
        s.close().await?;
        assert!(matches!(s.new(State::new("Iowa").into()).await, Err(StorageError::SessionClosed)));

        let s = store.open();
        s.save().await?;
        assert_eq!(s.count(Some("State")).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn closed_session_stays_closed_after_reload() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let s = store.open();
        s.close().await?;
        s.reload().await?;
        assert!(matches!(s.new(State::new("Idaho").into()).await, Err(StorageError::SessionClosed)));
        assert!(matches!(s.save().await, Err(StorageError::SessionClosed)));
        Ok(())
    }

    #[tokio::test]
    async fn count_without_filter_is_sum_of_kinds() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let state = State::new("Texas");
        let s = store.open();
        s.new(state.clone().into()).await?;
        s.new(City::new(&state.id, "Austin").into()).await?;
        s.new(Amenity::new("Pool").into()).await?;
        s.save().await?;

        let mut sum = 0;
        for kind in Kind::ALL {
            sum += s.count(Some(kind.as_str())).await?;
        }
        assert_eq!(sum, 3);
        assert_eq!(s.count(None).await?, sum);
        assert_eq!(s.all(None).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_state_removes_its_cities() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let state = State::new("Florida");
        let s = store.open();
        s.new(state.clone().into()).await?;
        s.save().await?;
        s.new(City::new(&state.id, "Miami").into()).await?;
        s.save().await?;
        assert_eq!(s.count(Some("City")).await?, 1);

        s.delete(&Record::from(state)).await?;
        s.save().await?;
        assert_eq!(s.count(Some("State")).await?, 0);
        assert_eq!(s.count(Some("City")).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_user_removes_places_and_reviews() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let state = State::new("Nevada");
        let city = City::new(&state.id, "Reno");
        let owner = User::new("owner@example.com", "pwd")?;
        let guest = User::new("guest@example.com", "pwd")?;
        let place = Place::new(&city.id, &owner.id, "Cabin");
        let review = Review::new(&place.id, &guest.id, "Cozy");

        let s = store.open();
        for rec in [
            Record::from(state),
            city.into(),
            owner.clone().into(),
            guest.into(),
            place.into(),
            review.into(),
        ] {
            s.new(rec).await?;
        }
        s.save().await?;

        s.delete(&Record::from(owner)).await?;
        s.save().await?;
        assert_eq!(s.count(Some("Place")).await?, 0);
        assert_eq!(s.count(Some("Review")).await?, 0);
        assert_eq!(s.count(Some("User")).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn place_amenities_follow_updates() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let state = State::new("Oregon");
        let city = City::new(&state.id, "Portland");
        let owner = User::new("host@example.com", "pwd")?;
        let wifi = Amenity::new("Wifi");
        let pool = Amenity::new("Pool");
        let mut place = Place::new(&city.id, &owner.id, "Loft");
        place.link_amenity(&wifi.id);
        place.link_amenity(&pool.id);
        place.latitude = Some(45.5);

        let s = store.open();
        for rec in [
            Record::from(state),
            city.into(),
            owner.into(),
            wifi.clone().into(),
            pool.clone().into(),
            place.clone().into(),
        ] {
            s.new(rec).await?;
        }
        s.save().await?;
        assert_eq!(s.get("Place", &place.id).await?, Some(Record::Place(place.clone())));

        place.unlink_amenity(&wifi.id);
        place.name = "Penthouse".into();
        s.new(place.clone().into()).await?;
        s.save().await?;
        assert_eq!(s.get("Place", &place.id).await?, Some(Record::Place(place.clone())));
        assert_eq!(s.count(Some("Place")).await?, 1);

        s.delete(&Record::from(pool)).await?;
        s.save().await?;
        match s.get("Place", &place.id).await? {
            Some(Record::Place(p)) => assert!(p.amenity_ids.is_empty()),
            other => panic!("place missing: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_every_staged_change() -> Result<(), anyhow::Error> {
        let store = get_db().await?;
        let s = store.open();
        s.new(State::new("Utah").into()).await?;
        s.new(City::new("no-such-state", "Nowhere").into()).await?;
        let res = s.save().await;
        assert!(matches!(res, Err(StorageError::Db(_))));
        assert_eq!(s.count(None).await?, 0);
        Ok(())
    }
}
