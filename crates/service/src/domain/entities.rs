use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, now, password};
use crate::errors::StorageError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        let ts = now();
        Self { id: new_id(), created_at: ts, updated_at: ts, name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state_id: String,
    pub name: String,
}

impl City {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        let ts = now();
        Self { id: new_id(), created_at: ts, updated_at: ts, state_id: state_id.into(), name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    /// Argon2 PHC string; plaintext is never stored.
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// Create a user, hashing `password` on the way in.
    pub fn new(email: impl Into<String>, password: &str) -> Result<Self, StorageError> {
        let ts = now();
        Ok(Self {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            email: email.into(),
            password: password::hash_password(password)?,
            first_name: None,
            last_name: None,
        })
    }

    pub fn set_password(&mut self, plain: &str) -> Result<(), StorageError> {
        self.password = password::hash_password(plain)?;
        Ok(())
    }

    pub fn verify_password(&self, plain: &str) -> bool {
        password::verify_password(plain, &self.password)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub city_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i32,
    #[serde(default)]
    pub number_bathrooms: i32,
    #[serde(default)]
    pub max_guest: i32,
    #[serde(default)]
    pub price_by_night: i32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Linked amenities, kept sorted and deduplicated.
    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn new(city_id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
        }
    }

    /// Returns false when the amenity was already linked.
    pub fn link_amenity(&mut self, amenity_id: &str) -> bool {
        match self.amenity_ids.binary_search_by(|a| a.as_str().cmp(amenity_id)) {
            Ok(_) => false,
            Err(pos) => {
                self.amenity_ids.insert(pos, amenity_id.to_string());
                true
            }
        }
    }

    /// Returns false when the amenity was not linked.
    pub fn unlink_amenity(&mut self, amenity_id: &str) -> bool {
        let before = self.amenity_ids.len();
        self.amenity_ids.retain(|a| a != amenity_id);
        before != self.amenity_ids.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        let ts = now();
        Self { id: new_id(), created_at: ts, updated_at: ts, name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub place_id: String,
    pub user_id: String,
    pub text: String,
}

impl Review {
    pub fn new(place_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}
