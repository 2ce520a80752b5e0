use std::net::SocketAddr;

use axum::{extract::Request, ServiceExt};
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::{runtime, Backend};

use crate::errors::StartupError;
use crate::routes::{self, App};
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Open the configured backend and build the router around it.
pub async fn build_app(cfg: &AppConfig) -> Result<App, StartupError> {
    runtime::ensure_env(cfg).await?;
    let backend = Backend::from_config(cfg).await?;
    backend.describe();
    info!(storage = ?backend.kind(), "storage backend ready");
    Ok(routes::build_router(AppState::new(backend), build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting hbnb api");
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}
