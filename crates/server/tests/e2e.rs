use std::net::SocketAddr;

use axum::{extract::Request, ServiceExt};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::{routes, state::AppState};
use service::{storage::FileStorage, Backend};

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let path = std::env::temp_dir().join(format!("hbnb_e2e_{}.json", Uuid::new_v4()));
    let backend = Backend::File(FileStorage::load(&path).await?);
    let app = routes::build_router(AppState::new(backend), CorsLayer::very_permissive());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

#[tokio::test]
async fn e2e_status() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::get(format!("{}/api/v1/status", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({"status": "OK"}));
    Ok(())
}

#[tokio::test]
async fn e2e_amenity_lifecycle() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/v1/amenities", app.base_url))
        .json(&json!({"name": "Pool"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .put(format!("{}/api/v1/amenities/{}", app.base_url, id))
        .json(&json!({"name": "Heated pool"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let listed: Value = client.get(format!("{}/api/v1/amenities", app.base_url)).send().await?.json().await?;
    assert_eq!(listed[0]["name"], "Heated pool");

    let res = client.delete(format!("{}/api/v1/amenities/{}", app.base_url, id)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = client.get(format!("{}/api/v1/amenities/{}", app.base_url, id)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}
