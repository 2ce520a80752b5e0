use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::domain::City;
use service::{Kind, Record};

use super::{fetch, json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

/// Cities of one state.
pub async fn list(State(state): State<AppState>, Path(state_id): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::State, &state_id).await?;
        let cities = store.all(Some(Kind::City.as_str())).await?;
        Ok(public_list(cities.values().filter(|c| c.is_owned_by(Kind::State, &state_id))))
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::State, &state_id).await?;
        let attrs = json_object(payload)?;
        let name = require_str(&attrs, "name")?;
        let mut rec = Record::from(City::new(state_id, name));
        objects::apply_extras(&mut rec, &attrs, &["name"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::City, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::City, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::City, id).await
}
