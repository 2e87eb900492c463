//! Process-local [`DocumentStore`] backend.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DocumentStore, Filter, StoreError, StoreResult, StoredDocument};

type Collection = Arc<RwLock<Vec<StoredDocument>>>;

/// In-memory document store.
///
/// Each collection is a creation-ordered vector behind its own lock, so every
/// operation is trivially atomic for the document it touches. Locks are never
/// held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.collections.get(name) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.collections
                .entry(name.to_string())
                .or_default()
                .value(),
        )
    }

    /// Number of documents currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collection(collection).read().len()
    }
}

#[rocket::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, body: Value) -> StoreResult<Uuid> {
        if !body.is_object() {
            return Err(StoreError::InvalidDocument(format!(
                "document body must be an object, got {body}"
            )));
        }
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.collection(collection).write().push(StoredDocument {
            id,
            version: 1,
            created_at: now,
            updated_at: now,
            body,
        });
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>> {
        let docs = self.collection(collection);
        let docs = docs.read();
        Ok(docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Vec<StoredDocument>> {
        let docs = self.collection(collection);
        let docs = docs.read();
        Ok(docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> StoreResult<bool> {
        let docs = self.collection(collection);
        let mut docs = docs.write();
        let Some(doc) = docs.iter_mut().find(|doc| filter.matches(doc)) else {
            return Ok(false);
        };
        let Some(body) = doc.body.as_object_mut() else {
            return Err(StoreError::InvalidDocument(format!(
                "stored document {} is not an object",
                doc.id
            )));
        };
        body.extend(fields);
        doc.version += 1;
        doc.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        let docs = self.collection(collection);
        let mut docs = docs.write();
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
