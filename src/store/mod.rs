//! Document store client interface. Collections are addressed by name; documents by `_id`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgDocumentStore, DEFAULT_STORE_SCHEMA};

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A single store record. Always carries a string `_id` once persisted.
pub type Document = Map<String, Value>;

/// Flat equality filter: every key must equal the document's value. Empty matches all.
pub type Query = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Query matching a single document by identifier.
pub fn id_query(id: &str) -> Query {
    let mut q = Query::new();
    q.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    q
}

/// Fresh identifier for an inserted document.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `doc` with `_id` set to `id`, placed first.
pub fn with_id(id: &str, doc: Document) -> Document {
    let mut out = Document::with_capacity(doc.len() + 1);
    out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    out.extend(doc.into_iter().filter(|(k, _)| k != ID_FIELD));
    out
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Prepare storage for a collection. Idempotent.
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Insert a document under a freshly generated `_id`; returns the stored form.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Query) -> Result<Option<Document>, StoreError>;

    async fn find_many(&self, collection: &str, filter: &Query) -> Result<Vec<Document>, StoreError>;

    /// Shallow-merge `changes` into every matching document. Returns the number modified.
    async fn update_many(&self, collection: &str, filter: &Query, changes: &Document) -> Result<u64, StoreError>;

    /// Remove every matching document. Returns the number removed.
    async fn remove_many(&self, collection: &str, filter: &Query) -> Result<u64, StoreError>;

    /// Replace the document with the same `_id`, inserting it if absent.
    async fn replace(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Equality match used by in-process stores. Numbers compare by value (1 == 1.0).
pub fn matches(doc: &Document, filter: &Query) -> bool {
    filter
        .iter()
        .all(|(k, v)| doc.get(k).map(|d| value_eq(d, v)).unwrap_or(false))
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(&doc(json!({"a": 1})), &Query::new()));
    }

    #[test]
    fn equality_per_key() {
        let d = doc(json!({"a": 1, "b": "x"}));
        assert!(matches(&d, &doc(json!({"a": 1.0}))));
        assert!(matches(&d, &doc(json!({"a": 1, "b": "x"}))));
        assert!(!matches(&d, &doc(json!({"b": "y"}))));
        assert!(!matches(&d, &doc(json!({"c": null}))));
    }

    #[test]
    fn id_query_targets_id_field() {
        assert_eq!(id_query("abc"), doc(json!({"_id": "abc"})));
    }
}
