//! RestBinder: derives the CRUD route table for one Service.

use crate::handlers::service::{create, delete, list, read, update};
use crate::service::Service;
use axum::{routing::get, Router};
use std::sync::Arc;

pub struct RestBinder;

impl RestBinder {
    /// `R` = service route:
    /// `GET R`, `POST R`, `GET R/:id`, `PUT R/:id`, `DELETE R/:id`.
    /// Every handler returns `AppError` on failure, so status translation happens in one place.
    pub fn bind(service: Arc<Service>) -> Router {
        let collection = service.route().to_string();
        let item = format!("{}/:id", collection);
        Router::new()
            .route(&collection, get(list).post(create))
            .route(&item, get(read).put(update).delete(delete))
            .with_state(service)
    }
}
