//! Router builders: process probes and per-service CRUD routes.

pub mod health;
pub mod service;

pub use health::health_routes;
pub use service::RestBinder;
