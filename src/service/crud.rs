//! Generic CRUD wrapper over one named collection.

use crate::error::AppError;
use crate::schema::Schema;
use crate::service::Model;
use crate::store::{Document, DocumentStore, Query};
use std::sync::Arc;

/// A registered collection. `name` is both the store collection and the URL path segment.
pub struct Service {
    name: String,
    route: String,
    model: Model,
}

impl Service {
    pub fn new(name: impl Into<String>, schema: Schema, store: Arc<dyn DocumentStore>) -> Self {
        let name = name.into();
        let route = format!("/{}", name);
        let model = Model::new(name.clone(), Arc::new(schema), store);
        Service { name, route, model }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always `"/" + name`.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn schema(&self) -> &Schema {
        self.model.schema()
    }

    /// Insert a document from `body`; returns it with its generated `_id`.
    pub async fn create(&self, body: Document) -> Result<Document, AppError> {
        self.model.create(body).await
    }

    /// At most one matching document. `None` is not an error; callers decide.
    pub async fn get(&self, query: Query) -> Result<Option<Document>, AppError> {
        self.model.find_one(query).await
    }

    pub async fn find(&self, query: Query) -> Result<Vec<Document>, AppError> {
        self.model.find(query).await
    }

    /// Raw store update of every match, for bulk use. Returns the number modified.
    pub async fn update(&self, query: Query, changes: Document) -> Result<u64, AppError> {
        self.model.update(query, changes).await
    }

    /// Remove every match; zero matches is success.
    pub async fn delete(&self, query: Query) -> Result<u64, AppError> {
        self.model.remove(query).await
    }

    /// Persist a document already mutated in memory; returns the stored form.
    pub async fn save(&self, document: Document) -> Result<Document, AppError> {
        self.model.save(document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldType};
    use crate::store::{id_query, MemoryStore, ID_FIELD};
    use serde_json::{json, Value};

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn service() -> Service {
        let schema = Schema::new()
            .field(FieldDescriptor::new("title", FieldType::String).required())
            .field(FieldDescriptor::new("rank", FieldType::Integer).with_default(json!(1)));
        Service::new("tasks", schema, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn route_is_slash_name() {
        assert_eq!(service().route(), "/tasks");
    }

    #[tokio::test]
    async fn create_then_get_by_id() {
        let svc = service();
        let created = svc.create(doc(json!({"title": "write", "_id": "mine"}))).await.unwrap();
        let id = created[ID_FIELD].as_str().unwrap().to_string();
        assert_ne!(id, "mine");
        assert_eq!(created["rank"], json!(1));

        let got = svc.get(id_query(&id)).await.unwrap().unwrap();
        assert_eq!(got, created);
        assert!(svc.get(id_query("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_invalid_body() {
        let err = service().create(doc(json!({"rank": 2}))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn bulk_update_and_delete() {
        let svc = service();
        svc.create(doc(json!({"title": "a"}))).await.unwrap();
        svc.create(doc(json!({"title": "b"}))).await.unwrap();
        svc.create(doc(json!({"title": "c", "rank": 5}))).await.unwrap();

        let n = svc.update(doc(json!({"rank": "1"})), doc(json!({"rank": 3}))).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(svc.find(doc(json!({"rank": 3}))).await.unwrap().len(), 2);

        assert_eq!(svc.delete(doc(json!({"rank": 3}))).await.unwrap(), 2);
        assert_eq!(svc.delete(doc(json!({"rank": 3}))).await.unwrap(), 0);
        assert_eq!(svc.find(Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_revalidates_and_persists() {
        let svc = service();
        let mut created = svc.create(doc(json!({"title": "a"}))).await.unwrap();
        created.insert("rank".into(), json!("7"));
        created.remove("title");
        assert!(svc.save(created.clone()).await.is_err());

        created.insert("title".into(), json!("b"));
        let saved = svc.save(created).await.unwrap();
        assert_eq!(saved["rank"], json!(7));
        let id = saved[ID_FIELD].as_str().unwrap();
        assert_eq!(svc.get(id_query(id)).await.unwrap().unwrap()["title"], json!("b"));

        assert!(svc.save(doc(json!({"title": "no id"}))).await.is_err());
    }
}
