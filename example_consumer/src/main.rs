//! Example consumer: declares a schema in code, registers it, seeds a document through the
//! registry (no HTTP), then serves the generated routes.
//!
//! Run from repo root: `cargo run -p example-consumer`

use autorest::{FieldDescriptor, FieldType, MemoryStore, Schema, ServiceRegistry};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("autorest=info")),
        )
        .init();

    let mut registry = ServiceRegistry::builder()
        .store(Arc::new(MemoryStore::new()))
        .build()?;
    let todos = Schema::new()
        .field(FieldDescriptor::new("title", FieldType::String).required())
        .field(FieldDescriptor::new("done", FieldType::Boolean).with_default(json!(false)));
    registry.add("todos", todos).await?;

    let service = registry.lookup("todos")?;
    let mut seed = serde_json::Map::new();
    seed.insert("title".into(), json!("try the generated API"));
    let created = service.create(seed).await?;
    tracing::info!(id = ?created.get("_id"), "seeded");

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}/todos", port);
    axum::serve(listener, registry.router().merge(registry.health_router())).await?;
    Ok(())
}
