//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::{BytesRejection, FormRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Startup-time failures: bad registrations, bad settings, missing store. Never reach request handling.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid service name '{0}': must be non-empty and contain only ASCII letters, digits, '-', '_' or '.'")]
    InvalidName(String),
    #[error("invalid schema for '{service}': {reason}")]
    InvalidSchema { service: String, reason: String },
    #[error("duplicate service: {0}")]
    DuplicateService(String),
    #[error("missing store connection: {0}")]
    MissingStore(String),
    #[error("service definitions: {0}")]
    Load(String),
    #[error("settings: {0}")]
    Settings(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by the document store client.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document has no _id")]
    MissingId,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Not found.")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),
    #[error("No service by the name of {0}")]
    UnknownService(String),
    /// An extractor refused the request; keeps the extractor's status (413 for an over-limit body).
    #[error("{1}")]
    Rejected(StatusCode, String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::UnknownService(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected(status, _) => *status,
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(e: BytesRejection) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(e: FormRejection) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}
