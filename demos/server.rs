//! Demo server: registers services from `SERVICES_PATH` (default `demos/services.json`) over PostgreSQL when
//! `DATABASE_URL` is set, otherwise over an in-memory store, and mounts common and service routes.

use autorest::{ensure_database_exists, load_definitions, MemoryStore, ServiceRegistry, Settings};
use axum::{extract::DefaultBodyLimit, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autorest=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let mut registry = match settings.database_url.as_deref() {
        Some(url) => {
            ensure_database_exists(url).await?;
            ServiceRegistry::connect(url, &settings.store_schema).await?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            ServiceRegistry::new(Arc::new(MemoryStore::new()))
        }
    };

    let services_path = settings
        .services_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("demos/services.json"));
    let definitions = load_definitions(&services_path).await?;
    registry.add_all(definitions).await?;
    tracing::info!(services = ?registry.names(), "services ready");

    let app = Router::new()
        .merge(registry.health_router())
        .nest("/api/v1", registry.router())
        .layer(RequestBodyLimitLayer::new(settings.body_limit))
        .layer(DefaultBodyLimit::max(settings.body_limit))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
