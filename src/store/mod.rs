//! Document store abstraction shared by every concept service.
//!
//! Concepts never talk to a database directly. They hold a typed
//! [`DocCollection`] that serializes their documents into JSON bodies and
//! forwards filter-based reads and writes to a [`DocumentStore`]. The store
//! only promises atomicity for a single document; anything stronger is built
//! on top by the caller (see the version-conditional helpers below).
//!
//! ## Backends
//!
//! - [`memory::MemoryStore`]: process-local store used by default and in tests
//! - [`postgres::PgDocumentStore`]: JSONB documents in a single Postgres table

pub mod filter;
pub mod locks;
pub mod memory;
pub mod postgres;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub use filter::Filter;
pub use locks::{KeyLockGuard, KeyLocks};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rocket_db_pools::sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] rocket_db_pools::sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// A raw document as persisted by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    /// Starts at 1 and is bumped by every successful update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: Value,
}

/// Minimal document database contract.
///
/// Every method is atomic for the single document it touches. `update_one`
/// merges the given top-level fields into the first matching document and
/// bumps its version; `delete_one` removes the first matching document.
/// "First" means oldest by creation order.
#[rocket::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, body: Value) -> StoreResult<Uuid>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>>;

    async fn find_many(&self, collection: &str, filter: &Filter)
    -> StoreResult<Vec<StoredDocument>>;

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> StoreResult<bool>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool>;
}

/// A typed document together with its store metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: Uuid,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub doc: T,
}

impl<T> Record<T> {
    /// Filter matching this exact revision of the record.
    pub fn revision_filter(&self) -> Filter {
        Filter::And(vec![Filter::Id(self.id), Filter::Version(self.version)])
    }
}

/// Typed view over one named collection of a [`DocumentStore`].
pub struct DocCollection<T> {
    store: Arc<dyn DocumentStore>,
    name: String,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Clone for DocCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            _doc: PhantomData,
        }
    }
}

impl<T> DocCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            _doc: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create_one(&self, doc: &T) -> StoreResult<Uuid> {
        let body = serde_json::to_value(doc)?;
        self.store.insert_one(&self.name, body).await
    }

    pub async fn read_one(&self, filter: &Filter) -> StoreResult<Option<Record<T>>> {
        match self.store.find_one(&self.name, filter).await? {
            Some(stored) => Ok(Some(decode(stored)?)),
            None => Ok(None),
        }
    }

    pub async fn read_many(&self, filter: &Filter) -> StoreResult<Vec<Record<T>>> {
        self.store
            .find_many(&self.name, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Merge `fields` into the first document matching `filter`.
    pub async fn partial_update_one(&self, filter: &Filter, fields: Value) -> StoreResult<bool> {
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidDocument(format!(
                    "partial update must be an object, got {other}"
                )));
            }
        };
        self.store.update_one(&self.name, filter, fields).await
    }

    /// Overwrite `record` with `doc`, but only if nobody changed it since it was read.
    pub async fn replace_if_current(&self, record: &Record<T>, doc: &T) -> StoreResult<bool> {
        self.partial_update_one(&record.revision_filter(), serde_json::to_value(doc)?)
            .await
    }

    pub async fn delete_one(&self, filter: &Filter) -> StoreResult<bool> {
        self.store.delete_one(&self.name, filter).await
    }

    /// Delete `record`, but only if nobody changed it since it was read.
    pub async fn delete_if_current(&self, record: &Record<T>) -> StoreResult<bool> {
        self.delete_one(&record.revision_filter()).await
    }
}

fn decode<T: DeserializeOwned>(stored: StoredDocument) -> StoreResult<Record<T>> {
    Ok(Record {
        id: stored.id,
        version: stored.version,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
        doc: serde_json::from_value(stored.body)?,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Store wrapper that yields to the scheduler before every call, so
    /// concurrently polled operations interleave between store round trips
    /// the way they would against a networked database.
    pub(crate) struct YieldingStore {
        inner: MemoryStore,
    }

    impl YieldingStore {
        pub(crate) fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
            }
        }
    }

    #[rocket::async_trait]
    impl DocumentStore for YieldingStore {
        async fn insert_one(&self, collection: &str, body: Value) -> StoreResult<Uuid> {
            tokio::task::yield_now().await;
            self.inner.insert_one(collection, body).await
        }

        async fn find_one(
            &self,
            collection: &str,
            filter: &Filter,
        ) -> StoreResult<Option<StoredDocument>> {
            tokio::task::yield_now().await;
            self.inner.find_one(collection, filter).await
        }

        async fn find_many(
            &self,
            collection: &str,
            filter: &Filter,
        ) -> StoreResult<Vec<StoredDocument>> {
            tokio::task::yield_now().await;
            self.inner.find_many(collection, filter).await
        }

        async fn update_one(
            &self,
            collection: &str,
            filter: &Filter,
            fields: Map<String, Value>,
        ) -> StoreResult<bool> {
            tokio::task::yield_now().await;
            self.inner.update_one(collection, filter, fields).await
        }

        async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
            tokio::task::yield_now().await;
            self.inner.delete_one(collection, filter).await
        }
    }
}
