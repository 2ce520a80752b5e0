use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::domain::Review;
use service::{Kind, Record};

use super::{fetch, json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, Path(place_id): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::Place, &place_id).await?;
        let reviews = store.all(Some(Kind::Review.as_str())).await?;
        Ok(public_list(reviews.values().filter(|r| r.is_owned_by(Kind::Place, &place_id))))
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        fetch(&*store, Kind::Place, &place_id).await?;
        let attrs = json_object(payload)?;
        let user_id = require_str(&attrs, "user_id")?;
        fetch(&*store, Kind::User, &user_id).await?;
        let text = require_str(&attrs, "text")?;
        let mut rec = Record::from(Review::new(place_id, user_id, text));
        objects::apply_extras(&mut rec, &attrs, &["user_id", "text"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::Review, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::Review, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::Review, id).await
}
