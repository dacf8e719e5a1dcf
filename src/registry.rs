//! ServiceRegistry: named Services over one shared store, plus the route table derived from them.
//! Mutated only during startup (`&mut self`); afterwards each Service is shared read-only via `Arc`.

use crate::config::ServiceDefinition;
use crate::error::{AppError, ConfigError};
use crate::routes::{health_routes, RestBinder};
use crate::schema::{validate_schema, Schema};
use crate::service::Service;
use crate::store::{DocumentStore, PgDocumentStore};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ServiceRegistry {
    store: Arc<dyn DocumentStore>,
    services: HashMap<String, Arc<Service>>,
    router: Router,
}

#[derive(Default)]
pub struct RegistryBuilder {
    store: Option<Arc<dyn DocumentStore>>,
}

impl RegistryBuilder {
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<ServiceRegistry, ConfigError> {
        let store = self
            .store
            .ok_or_else(|| ConfigError::MissingStore("no store connection configured".into()))?;
        Ok(ServiceRegistry::new(store))
    }
}

impl ServiceRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ServiceRegistry {
            store,
            services: HashMap::new(),
            router: Router::new(),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry over a PostgreSQL document store. Fails fast on an empty URL or an unreachable database.
    pub async fn connect(database_url: &str, schema: &str) -> Result<Self, ConfigError> {
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingStore("DATABASE_URL is empty".into()));
        }
        let store = PgDocumentStore::connect(database_url, schema)
            .await
            .map_err(|e| ConfigError::MissingStore(e.to_string()))?;
        Ok(ServiceRegistry::new(Arc::new(store)))
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Register a service: validate name and schema, prepare its collection, bind its routes.
    /// A name that is already registered is rejected.
    pub async fn add(&mut self, name: &str, schema: Schema) -> Result<Arc<Service>, ConfigError> {
        validate_name(name)?;
        validate_schema(name, &schema)?;
        if self.services.contains_key(name) {
            return Err(ConfigError::DuplicateService(name.to_string()));
        }
        self.store.ensure_collection(name).await?;

        let service = Arc::new(Service::new(name, schema, self.store.clone()));
        let routes = RestBinder::bind(service.clone());
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.merge(routes);
        self.services.insert(name.to_string(), service.clone());
        tracing::info!(service = %name, route = %service.route(), "service registered");
        Ok(service)
    }

    /// Register definitions in order, stopping at the first failure.
    pub async fn add_all(&mut self, definitions: Vec<ServiceDefinition>) -> Result<(), ConfigError> {
        for def in definitions {
            self.add(&def.name, def.schema).await?;
        }
        Ok(())
    }

    /// Programmatic access for code outside the REST layer.
    pub fn lookup(&self, name: &str) -> Result<Arc<Service>, AppError> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownService(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Route table of every registered service, for the host to mount.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// `/health`, `/ready` and `/version` over this registry's store.
    pub fn health_router(&self) -> Router {
        health_routes(self.store.clone())
    }
}

/// ASCII letters, digits, `-`, `_` and `.`, not starting with `.`: safe as a path segment and a table name.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if name.is_empty() || name.starts_with('.') || !name.chars().all(allowed) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}
