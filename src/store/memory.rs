//! Process-local document store. Each operation is atomic on its own; there are no transactions.

use crate::error::StoreError;
use crate::merge::merge_fields;
use crate::store::{matches, new_id, with_id, Document, DocumentStore, Query, ID_FIELD};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let doc = with_id(&new_id(), doc);
        tracing::debug!(collection = %collection, "insert");
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn find_one(&self, collection: &str, filter: &Query) -> Result<Option<Document>, StoreError> {
        tracing::debug!(collection = %collection, filter = ?filter, "find_one");
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)))
            .cloned())
    }

    async fn find_many(&self, collection: &str, filter: &Query) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(collection = %collection, filter = ?filter, "find_many");
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn update_many(&self, collection: &str, filter: &Query, changes: &Document) -> Result<u64, StoreError> {
        tracing::debug!(collection = %collection, filter = ?filter, "update_many");
        let mut guard = self.collections.write().await;
        let mut modified = 0;
        if let Some(docs) = guard.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
                merge_fields(doc, changes.clone());
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn remove_many(&self, collection: &str, filter: &Query) -> Result<u64, StoreError> {
        tracing::debug!(collection = %collection, filter = ?filter, "remove_many");
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !matches(d, filter));
        Ok((before - docs.len()) as u64)
    }

    async fn replace(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = doc
            .get(ID_FIELD)
            .cloned()
            .ok_or(StoreError::MissingId)?;
        tracing::debug!(collection = %collection, id = %id, "replace");
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.get(ID_FIELD) == Some(&id)) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_fresh_ids() {
        let store = MemoryStore::new();
        let a = store.insert("notes", doc(json!({"t": "a"}))).await.unwrap();
        let b = store.insert("notes", doc(json!({"t": "a"}))).await.unwrap();
        assert!(a[ID_FIELD].is_string());
        assert_ne!(a[ID_FIELD], b[ID_FIELD]);
        assert_eq!(store.find_many("notes", &Query::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.find_one("nope", &Query::new()).await.unwrap().is_none());
        assert!(store.find_many("nope", &Query::new()).await.unwrap().is_empty());
        assert_eq!(store.remove_many("nope", &Query::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_and_remove_by_filter() {
        let store = MemoryStore::new();
        store.insert("notes", doc(json!({"k": 1, "v": 0}))).await.unwrap();
        store.insert("notes", doc(json!({"k": 1, "v": 0}))).await.unwrap();
        store.insert("notes", doc(json!({"k": 2, "v": 0}))).await.unwrap();

        let n = store
            .update_many("notes", &doc(json!({"k": 1})), &doc(json!({"v": 9})))
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.find_many("notes", &doc(json!({"v": 9}))).await.unwrap().len(), 2);

        assert_eq!(store.remove_many("notes", &doc(json!({"k": 1}))).await.unwrap(), 2);
        let left = store.find_many("notes", &Query::new()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0]["k"], json!(2));
    }

    #[tokio::test]
    async fn replace_overwrites_or_inserts() {
        let store = MemoryStore::new();
        let mut saved = store.insert("notes", doc(json!({"t": "a"}))).await.unwrap();
        saved.insert("t".into(), json!("b"));
        store.replace("notes", saved.clone()).await.unwrap();
        let all = store.find_many("notes", &Query::new()).await.unwrap();
        assert_eq!(all, vec![saved]);

        store.replace("notes", doc(json!({"_id": "fixed", "t": "c"}))).await.unwrap();
        assert_eq!(store.find_many("notes", &Query::new()).await.unwrap().len(), 2);
        assert!(store.replace("notes", doc(json!({"t": "d"}))).await.is_err());
    }
}
