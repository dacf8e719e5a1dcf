//! Service CRUD handlers: list, create, read, update, delete.
//! PUT and DELETE are two store round trips (fetch, then save/delete) with no transaction between them;
//! a concurrent write in between can be overwritten.

use crate::error::AppError;
use crate::extractors::{pairs_to_document, Payload};
use crate::merge::merge_fields;
use crate::service::Service;
use crate::store::{id_query, Document, ID_FIELD};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

async fn fetch(service: &Service, id: &str) -> Result<Document, AppError> {
    service.get(id_query(id)).await?.ok_or(AppError::NotFound)
}

pub async fn list(
    State(service): State<Arc<Service>>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Document>>, AppError> {
    let Query(params) = params?;
    let rows = service.find(pairs_to_document(params)).await?;
    Ok(Json(rows))
}

pub async fn create(
    State(service): State<Arc<Service>>,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let created = service.create(body).await?;
    tracing::debug!(service = %service.name(), id = ?created.get(ID_FIELD), "created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn read(
    State(service): State<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(fetch(&service, &id).await?))
}

pub async fn update(
    State(service): State<Arc<Service>>,
    Path(id): Path<String>,
    Payload(mut body): Payload,
) -> Result<Json<Document>, AppError> {
    let mut doc = fetch(&service, &id).await?;
    body.remove(ID_FIELD);
    merge_fields(&mut doc, body);
    let saved = service.save(doc).await?;
    Ok(Json(saved))
}

pub async fn delete(
    State(service): State<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<&'static str, AppError> {
    fetch(&service, &id).await?;
    service.delete(id_query(&id)).await?;
    Ok("Deleted.")
}
