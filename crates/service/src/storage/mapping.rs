//! Conversions between domain entities and SeaORM rows.

use chrono::Utc;
use models::{amenity, city, place, place_amenity, review, state, user};
use sea_orm::{prelude::DateTimeWithTimeZone, Set};

use crate::domain::{Amenity, City, Place, Review, State, User};

fn utc(ts: DateTimeWithTimeZone) -> chrono::DateTime<Utc> {
    ts.with_timezone(&Utc)
}

impl From<state::Model> for State {
    fn from(m: state::Model) -> Self {
        Self { id: m.id, created_at: utc(m.created_at), updated_at: utc(m.updated_at), name: m.name }
    }
}

impl From<city::Model> for City {
    fn from(m: city::Model) -> Self {
        Self {
            id: m.id,
            created_at: utc(m.created_at),
            updated_at: utc(m.updated_at),
            state_id: m.state_id,
            name: m.name,
        }
    }
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            created_at: utc(m.created_at),
            updated_at: utc(m.updated_at),
            email: m.email,
            password: m.password,
            first_name: m.first_name,
            last_name: m.last_name,
        }
    }
}

impl From<amenity::Model> for Amenity {
    fn from(m: amenity::Model) -> Self {
        Self { id: m.id, created_at: utc(m.created_at), updated_at: utc(m.updated_at), name: m.name }
    }
}

impl From<review::Model> for Review {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            created_at: utc(m.created_at),
            updated_at: utc(m.updated_at),
            place_id: m.place_id,
            user_id: m.user_id,
            text: m.text,
        }
    }
}

/// Places need their junction rows; `amenity_ids` must already be sorted.
pub(crate) fn place_from_row(m: place::Model, amenity_ids: Vec<String>) -> Place {
    Place {
        id: m.id,
        created_at: utc(m.created_at),
        updated_at: utc(m.updated_at),
        city_id: m.city_id,
        user_id: m.user_id,
        name: m.name,
        description: m.description,
        number_rooms: m.number_rooms,
        number_bathrooms: m.number_bathrooms,
        max_guest: m.max_guest,
        price_by_night: m.price_by_night,
        latitude: m.latitude,
        longitude: m.longitude,
        amenity_ids,
    }
}

pub(crate) fn state_row(s: &State) -> state::ActiveModel {
    state::ActiveModel {
        id: Set(s.id.clone()),
        created_at: Set(s.created_at.into()),
        updated_at: Set(s.updated_at.into()),
        name: Set(s.name.clone()),
    }
}

pub(crate) fn city_row(c: &City) -> city::ActiveModel {
    city::ActiveModel {
        id: Set(c.id.clone()),
        created_at: Set(c.created_at.into()),
        updated_at: Set(c.updated_at.into()),
        state_id: Set(c.state_id.clone()),
        name: Set(c.name.clone()),
    }
}

pub(crate) fn user_row(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id.clone()),
        created_at: Set(u.created_at.into()),
        updated_at: Set(u.updated_at.into()),
        email: Set(u.email.clone()),
        password: Set(u.password.clone()),
        first_name: Set(u.first_name.clone()),
        last_name: Set(u.last_name.clone()),
    }
}

pub(crate) fn amenity_row(a: &Amenity) -> amenity::ActiveModel {
    amenity::ActiveModel {
        id: Set(a.id.clone()),
        created_at: Set(a.created_at.into()),
        updated_at: Set(a.updated_at.into()),
        name: Set(a.name.clone()),
    }
}

pub(crate) fn place_row(p: &Place) -> place::ActiveModel {
    place::ActiveModel {
        id: Set(p.id.clone()),
        created_at: Set(p.created_at.into()),
        updated_at: Set(p.updated_at.into()),
        city_id: Set(p.city_id.clone()),
        user_id: Set(p.user_id.clone()),
        name: Set(p.name.clone()),
        description: Set(p.description.clone()),
        number_rooms: Set(p.number_rooms),
        number_bathrooms: Set(p.number_bathrooms),
        max_guest: Set(p.max_guest),
        price_by_night: Set(p.price_by_night),
        latitude: Set(p.latitude),
        longitude: Set(p.longitude),
    }
}

pub(crate) fn place_amenity_rows(p: &Place) -> Vec<place_amenity::ActiveModel> {
    p.amenity_ids
        .iter()
        .map(|a| place_amenity::ActiveModel { place_id: Set(p.id.clone()), amenity_id: Set(a.clone()) })
        .collect()
}

pub(crate) fn review_row(r: &Review) -> review::ActiveModel {
    review::ActiveModel {
        id: Set(r.id.clone()),
        created_at: Set(r.created_at.into()),
        updated_at: Set(r.updated_at.into()),
        place_id: Set(r.place_id.clone()),
        user_id: Set(r.user_id.clone()),
        text: Set(r.text.clone()),
    }
}
