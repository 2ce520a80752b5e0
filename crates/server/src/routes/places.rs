use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::domain::Place;
use service::{Kind, Record};

use super::{fetch, json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

/// Places of one city.
pub async fn list(State(state): State<AppState>, Path(city_id): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::City, &city_id).await?;
        let places = store.all(Some(Kind::Place.as_str())).await?;
        Ok(public_list(places.values().filter(|p| p.is_owned_by(Kind::City, &city_id))))
    })
    .await
}

/// Create a place in a city on behalf of an existing user.
pub async fn create(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::City, &city_id).await?;
        let attrs = json_object(payload)?;
        let user_id = require_str(&attrs, "user_id")?;
        fetch(&*store, Kind::User, &user_id).await?;
        let name = require_str(&attrs, "name")?;
        let mut rec = Record::from(Place::new(city_id, user_id, name));
        objects::apply_extras(&mut rec, &attrs, &["user_id", "name"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::Place, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::Place, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::Place, id).await
}
