//! Schema-bound handle on one store collection. Every write is conformed to the schema first.

use crate::error::{AppError, StoreError};
use crate::schema::{cast_query, conform_changes, conform_document, Schema};
use crate::store::{Document, DocumentStore, Query, ID_FIELD};
use std::sync::Arc;

#[derive(Clone)]
pub struct Model {
    collection: String,
    schema: Arc<Schema>,
    store: Arc<dyn DocumentStore>,
}

impl Model {
    pub fn new(collection: impl Into<String>, schema: Arc<Schema>, store: Arc<dyn DocumentStore>) -> Self {
        Model {
            collection: collection.into(),
            schema,
            store,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Insert a new document. A client-supplied `_id` is discarded; the store assigns one.
    pub async fn create(&self, mut body: Document) -> Result<Document, AppError> {
        body.remove(ID_FIELD);
        let doc = conform_document(&self.schema, body)?;
        Ok(self.store.insert(&self.collection, doc).await?)
    }

    pub async fn find_one(&self, query: Query) -> Result<Option<Document>, AppError> {
        let query = cast_query(&self.schema, query);
        Ok(self.store.find_one(&self.collection, &query).await?)
    }

    pub async fn find(&self, query: Query) -> Result<Vec<Document>, AppError> {
        let query = cast_query(&self.schema, query);
        Ok(self.store.find_many(&self.collection, &query).await?)
    }

    pub async fn update(&self, query: Query, changes: Document) -> Result<u64, AppError> {
        let query = cast_query(&self.schema, query);
        let changes = conform_changes(&self.schema, changes)?;
        if changes.is_empty() {
            return Ok(0);
        }
        Ok(self.store.update_many(&self.collection, &query, &changes).await?)
    }

    pub async fn remove(&self, query: Query) -> Result<u64, AppError> {
        let query = cast_query(&self.schema, query);
        Ok(self.store.remove_many(&self.collection, &query).await?)
    }

    /// Re-validate an in-memory document (defaults, required, casts) and persist it by `_id`.
    pub async fn save(&self, doc: Document) -> Result<Document, AppError> {
        if !doc.get(ID_FIELD).map(|v| v.is_string()).unwrap_or(false) {
            return Err(AppError::Validation(StoreError::MissingId.to_string()));
        }
        let doc = conform_document(&self.schema, doc)?;
        Ok(self.store.replace(&self.collection, doc).await?)
    }
}
