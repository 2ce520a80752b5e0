use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::domain::Amenity;
use service::{Kind, Record};

use super::{json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        let amenities = store.all(Some(Kind::Amenity.as_str())).await?;
        Ok(public_list(amenities.values()))
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        let attrs = json_object(payload)?;
        let name = require_str(&attrs, "name")?;
        let mut rec = Record::from(Amenity::new(name));
        objects::apply_extras(&mut rec, &attrs, &["name"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::Amenity, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::Amenity, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::Amenity, id).await
}
