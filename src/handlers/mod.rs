//! HTTP handlers for per-service CRUD.

pub mod service;
pub use service::*;
