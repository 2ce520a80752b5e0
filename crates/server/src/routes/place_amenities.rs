//! Links between places and amenities.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use service::{Kind, Record, Storage};

use super::{fetch, public_list, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

async fn fetch_place(store: &dyn Storage, place_id: &str) -> Result<service::domain::Place, ApiError> {
    match fetch(store, Kind::Place, place_id).await? {
        Record::Place(p) => Ok(p),
        _ => Err(ApiError::NotFound),
    }
}

pub async fn list(State(state): State<AppState>, Path(place_id): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        let place = fetch_place(&*store, &place_id).await?;
        let mut amenities = Vec::with_capacity(place.amenity_ids.len());
        for id in &place.amenity_ids {
            if let Some(rec) = store.get(Kind::Amenity.as_str(), id).await? {
                amenities.push(rec);
            }
        }
        Ok(public_list(&amenities))
    })
    .await
}

/// Link an amenity; 200 if it already was.
pub async fn link(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        let mut place = fetch_place(&*store, &place_id).await?;
        let amenity = fetch(&*store, Kind::Amenity, &amenity_id).await?;
        if !place.link_amenity(&amenity_id) {
            return Ok((StatusCode::OK, Json(amenity.to_public_json())));
        }
        let mut rec = Record::from(place);
        rec.touch();
        store.new(rec).await?;
        store.save().await?;
        debug!(%place_id, %amenity_id, "amenity linked");
        Ok((StatusCode::CREATED, Json(amenity.to_public_json())))
    })
    .await
}

pub async fn unlink(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    scoped(&state, move |store| async move {
        let mut place = fetch_place(&*store, &place_id).await?;
        fetch(&*store, Kind::Amenity, &amenity_id).await?;
        if !place.unlink_amenity(&amenity_id) {
            return Err(ApiError::NotFound);
        }
        let mut rec = Record::from(place);
        rec.touch();
        store.new(rec).await?;
        store.save().await?;
        debug!(%place_id, %amenity_id, "amenity unlinked");
        Ok(Json(json!({})))
    })
    .await
}
