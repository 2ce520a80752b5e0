//! Domain entities shared by both storage backends.
//!
//! `Record` is the tagged union stored under composite keys (`"State.<id>"`).
//! The `__class__` tag selects the concrete entity when a document is read
//! back, so reconstruction never goes through untyped attribute maps.

pub mod entities;
pub mod password;

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use entities::{Amenity, City, Place, Review, State, User};

use crate::errors::StorageError;

/// Current time truncated to microseconds, the finest precision every
/// backend round-trips.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Entity type names, as used in composite keys and type filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Amenity,
    City,
    Place,
    Review,
    State,
    User,
}

impl Kind {
    pub const ALL: [Kind; 6] = [Kind::Amenity, Kind::City, Kind::Place, Kind::Review, Kind::State, Kind::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Amenity => "Amenity",
            Kind::City => "City",
            Kind::Place => "Place",
            Kind::Review => "Review",
            Kind::State => "State",
            Kind::User => "User",
        }
    }

    /// Lowercase plural used by the stats endpoint.
    pub fn plural(self) -> &'static str {
        match self {
            Kind::Amenity => "amenities",
            Kind::City => "cities",
            Kind::Place => "places",
            Kind::Review => "reviews",
            Kind::State => "states",
            Kind::User => "users",
        }
    }

    pub fn parse(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Resolve an optional type filter. `None` selects every kind; an
    /// unknown name selects nothing.
    pub fn select(filter: Option<&str>) -> Vec<Kind> {
        match filter {
            None => Kind::ALL.to_vec(),
            Some(name) => Kind::parse(name).into_iter().collect(),
        }
    }

    pub fn key(self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }

    /// Attributes an update may not touch, beyond id and timestamps.
    fn immutable_keys(self) -> &'static [&'static str] {
        match self {
            Kind::City => &["state_id"],
            Kind::Place => &["city_id", "user_id", "amenity_ids"],
            Kind::Review => &["place_id", "user_id"],
            Kind::User => &["email"],
            Kind::Amenity | Kind::State => &[],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PROTECTED_KEYS: [&str; 4] = ["id", "created_at", "updated_at", "__class__"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Record {
    Amenity(Amenity),
    City(City),
    Place(Place),
    Review(Review),
    State(State),
    User(User),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::Amenity(_) => Kind::Amenity,
            Record::City(_) => Kind::City,
            Record::Place(_) => Kind::Place,
            Record::Review(_) => Kind::Review,
            Record::State(_) => Kind::State,
            Record::User(_) => Kind::User,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Amenity(e) => &e.id,
            Record::City(e) => &e.id,
            Record::Place(e) => &e.id,
            Record::Review(e) => &e.id,
            Record::State(e) => &e.id,
            Record::User(e) => &e.id,
        }
    }

    /// Composite key: type name and id.
    pub fn key(&self) -> String {
        self.kind().key(self.id())
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        let ts = now();
        match self {
            Record::Amenity(e) => e.updated_at = ts,
            Record::City(e) => e.updated_at = ts,
            Record::Place(e) => e.updated_at = ts,
            Record::Review(e) => e.updated_at = ts,
            Record::State(e) => e.updated_at = ts,
            Record::User(e) => e.updated_at = ts,
        }
    }

    /// Whether this record is a direct dependent of `parent`, i.e. removed
    /// when the parent is deleted.
    pub fn is_owned_by(&self, parent: Kind, parent_id: &str) -> bool {
        match (parent, self) {
            (Kind::State, Record::City(c)) => c.state_id == parent_id,
            (Kind::City, Record::Place(p)) => p.city_id == parent_id,
            (Kind::User, Record::Place(p)) => p.user_id == parent_id,
            (Kind::User, Record::Review(r)) => r.user_id == parent_id,
            (Kind::Place, Record::Review(r)) => r.place_id == parent_id,
            _ => false,
        }
    }

    /// Full attribute map, including the `__class__` tag and the password hash.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Attribute map for API responses; never exposes the password hash.
    pub fn to_public_json(&self) -> Value {
        let mut value = self.to_json();
        if let (Record::User(_), Some(obj)) = (self, value.as_object_mut()) {
            obj.remove("password");
        }
        value
    }

    /// Apply user-supplied attributes and refresh `updated_at`.
    ///
    /// Ids, timestamps, the type tag and relation keys are ignored. A
    /// `password` is re-hashed. Values of the wrong shape are rejected and
    /// leave the record unchanged.
    pub fn merge(&mut self, attrs: &Map<String, Value>) -> Result<(), StorageError> {
        let kind = self.kind();
        let mut value = self.to_json();
        let obj = value
            .as_object_mut()
            .ok_or_else(|| StorageError::Validation("record is not an object".into()))?;

        let mut new_password = None;
        for (k, v) in attrs {
            let k = k.as_str();
            if PROTECTED_KEYS.contains(&k) || kind.immutable_keys().contains(&k) {
                continue;
            }
            if kind == Kind::User && k == "password" {
                let plain = v.as_str().ok_or_else(|| StorageError::Validation("password must be a string".into()))?;
                new_password = Some(plain.to_string());
                continue;
            }
            obj.insert(k.to_string(), v.clone());
        }

        let mut merged: Record = serde_json::from_value(value).map_err(|e| StorageError::Validation(e.to_string()))?;
        if let (Some(plain), Record::User(u)) = (new_password, &mut merged) {
            u.set_password(&plain)?;
        }
        merged.touch();
        *self = merged;
        Ok(())
    }
}

macro_rules! impl_from_entity {
    ($($ty:ident),*) => {
        $(impl From<$ty> for Record {
            fn from(e: $ty) -> Self { Record::$ty(e) }
        })*
    };
}

impl_from_entity!(Amenity, City, Place, Review, State, User);
