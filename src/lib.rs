//! autorest: generic CRUD REST services over named, schema-bound document collections.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod merge;
pub mod registry;
pub mod routes;
pub mod schema;
pub mod service;
pub mod store;

pub use config::{load_definitions, validate_definitions, ServiceDefinition, Settings};
pub use error::{AppError, ConfigError, StoreError};
pub use merge::merge_fields;
pub use registry::{RegistryBuilder, ServiceRegistry};
pub use routes::{health_routes, RestBinder};
pub use schema::{FieldDescriptor, FieldType, Schema};
pub use service::{Model, Service};
pub use store::{ensure_database_exists, Document, DocumentStore, MemoryStore, PgDocumentStore, Query, ID_FIELD};
