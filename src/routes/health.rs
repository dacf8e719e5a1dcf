//! Process probes served next to the generated services: liveness, store readiness, build identity.

use crate::store::DocumentStore;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Probe {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<&'static str>,
}

impl Probe {
    fn readiness(store_up: bool) -> (StatusCode, Json<Probe>) {
        if store_up {
            (StatusCode::OK, Json(Probe { status: "ok", store: Some("ok") }))
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Probe {
                    status: "degraded",
                    store: Some("unavailable"),
                }),
            )
        }
    }
}

#[derive(Serialize)]
struct Build {
    name: &'static str,
    version: &'static str,
}

async fn live() -> Json<Probe> {
    Json(Probe { status: "ok", store: None })
}

async fn ready(State(store): State<Arc<dyn DocumentStore>>) -> (StatusCode, Json<Probe>) {
    let up = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            false
        }
    };
    Probe::readiness(up)
}

async fn build() -> Json<Build> {
    Json(Build {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /health`, `GET /ready` (pings `store`, 503 when it fails) and `GET /version`.
pub fn health_routes(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/health", get(live))
        .route("/ready", get(ready))
        .route("/version", get(build))
        .with_state(store)
}
