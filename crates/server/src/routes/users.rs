use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use service::domain::User;
use service::{Kind, Record};

use super::{json_object, objects, public_list, require_str, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    scoped(&state, move |store| async move {
        let users = store.all(Some(Kind::User.as_str())).await?;
        Ok(public_list(users.values()))
    })
    .await
}

/// Register a user; the password is hashed before anything is stored.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    scoped(&state, move |store| async move {
        let attrs = json_object(payload)?;
        let email = require_str(&attrs, "email")?;
        let password = require_str(&attrs, "password")?;
        let user = User::new(email, &password)?;
        let id = user.id.clone();
        let mut rec = Record::from(user);
        objects::apply_extras(&mut rec, &attrs, &["email", "password"])?;
        store.new(rec.clone()).await?;
        store.save().await?;
        info!(user_id = %id, "user created");
        Ok((StatusCode::CREATED, Json(rec.to_public_json())))
    })
    .await
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::read(&state, Kind::User, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    objects::update(&state, Kind::User, id, payload).await
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    objects::remove(&state, Kind::User, id).await
}
