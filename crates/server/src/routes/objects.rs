//! Read, update and delete handlers shared by every entity type.

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Map, Value};
use tracing::debug;

use service::{Kind, Record};

use super::{fetch, json_object, scoped};
use crate::errors::ApiError;
use crate::state::AppState;

pub(crate) async fn read(state: &AppState, kind: Kind, id: String) -> Result<Json<Value>, ApiError> {
    scoped(state, move |store| async move {
        let rec = fetch(&*store, kind, &id).await?;
        Ok(Json(rec.to_public_json()))
    })
    .await
}

pub(crate) async fn update(
    state: &AppState,
    kind: Kind,
    id: String,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    scoped(state, move |store| async move {
        let mut rec = fetch(&*store, kind, &id).await?;
        let attrs = json_object(payload)?;
        rec.merge(&attrs)?;
        store.new(rec.clone()).await?;
        store.save().await?;
        debug!(%kind, %id, "updated");
        Ok(Json(rec.to_public_json()))
    })
    .await
}

pub(crate) async fn remove(state: &AppState, kind: Kind, id: String) -> Result<Json<Value>, ApiError> {
    scoped(state, move |store| async move {
        let rec = fetch(&*store, kind, &id).await?;
        store.delete(&rec).await?;
        store.save().await?;
        debug!(%kind, %id, "deleted");
        Ok(Json(json!({})))
    })
    .await
}

/// Apply whatever optional attributes came with a create request.
/// `consumed` names the fields already used to construct the record.
pub(crate) fn apply_extras(rec: &mut Record, attrs: &Map<String, Value>, consumed: &[&str]) -> Result<(), ApiError> {
    let extras: Map<String, Value> = attrs
        .iter()
        .filter(|(k, _)| !consumed.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !extras.is_empty() {
        rec.merge(&extras)?;
    }
    Ok(())
}
