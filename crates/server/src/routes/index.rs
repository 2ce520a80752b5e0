use axum::{extract::State, Json};
use common::types::{Stats, Status};
use service::Kind;

use super::scoped;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn status() -> Json<Status> {
    Json(Status::ok())
}

/// Object counts per type.
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    scoped(&state, move |store| async move {
        let mut stats = Stats::new();
        for kind in Kind::ALL {
            stats.insert(kind.plural().to_string(), store.count(Some(kind.as_str())).await?);
        }
        Ok(Json(stats))
    })
    .await
}
