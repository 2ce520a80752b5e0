use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::domain::State as StateEntity;
use service::{Kind, Record};

use super::{json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        let states = store.all(Some(Kind::State.as_str())).await?;
        Ok(public_list(states.values()))
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
        let mut rec = Record::from(StateEntity::new(name));
        objects::apply_extras(&mut rec, &attrs, &["name"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::State, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::State, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::State, id).await
}
