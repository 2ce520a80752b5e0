use std::{future::Future, sync::Arc};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use common::types::ErrorBody;
use service::{Kind, Record, Storage};

use crate::errors::ApiError;
use crate::state::AppState;

pub mod amenities;
pub mod cities;
pub mod index;
pub mod objects;
pub mod place_amenities;
pub mod places;
pub mod reviews;
pub mod states;
pub mod users;

/// The routed application. Trailing slashes are trimmed before routing,
/// so `/api/v1/states/` and `/api/v1/states` are the same resource.
pub type App = NormalizePath<Router>;

/// Build the full application router under `/api/v1`.
pub fn build_router(state: AppState, cors: CorsLayer) -> App {
    let api = Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/states", get(states::list).post(states::create))
        .route("/states/:state_id", get(states::read).put(states::update).delete(states::remove))
        .route("/states/:state_id/cities", get(cities::list).post(cities::create))
        .route("/cities/:city_id", get(cities::read).put(cities::update).delete(cities::remove))
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route("/amenities/:amenity_id", get(amenities::read).put(amenities::update).delete(amenities::remove))
        .route("/users", get(users::list).post(users::create))
        .route("/users/:user_id", get(users::read).put(users::update).delete(users::remove))
        .route("/cities/:city_id/places", get(places::list).post(places::create))
        .route("/places/:place_id", get(places::read).put(places::update).delete(places::remove))
        .route("/places/:place_id/reviews", get(reviews::list).post(reviews::create))
        .route("/reviews/:review_id", get(reviews::read).put(reviews::update).delete(reviews::remove))
        .route("/places/:place_id/amenities", get(place_amenities::list))
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(place_amenities::link).delete(place_amenities::unlink),
        );

    let router = Router::new()
        .nest("/api/v1", api)
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found")))
}

/// Run `f` against a storage handle opened for this request, closing the
/// handle afterwards whatever `f` returned.
pub(crate) async fn scoped<T, F, Fut>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(Arc<dyn Storage>) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let store: Arc<dyn Storage> = Arc::from(state.backend.open());
    let out = f(Arc::clone(&store)).await;
    if let Err(e) = store.close().await {
        warn!(error = %e, "closing storage failed");
    }
    out
}

/// Look up `kind.id` or fail with 404.
pub(crate) async fn fetch(store: &dyn Storage, kind: Kind, id: &str) -> Result<Record, ApiError> {
    store.get(kind.as_str(), id).await?.ok_or(ApiError::NotFound)
}

/// Accept only a JSON object body.
pub(crate) fn json_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(obj))) => Ok(obj),
        _ => Err(ApiError::NotAJson),
    }
}

pub(crate) fn require_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, ApiError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ApiError::Missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::BadRequest(format!("{field} must be a string"))),
    }
}

pub(crate) fn public_list<'a>(records: impl IntoIterator<Item = &'a Record>) -> Json<Vec<Value>> {
    Json(records.into_iter().map(Record::to_public_json).collect())
}
