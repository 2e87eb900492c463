//! Journaling concept: titled, owned collections of object references.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{DocCollection, DocumentStore, Filter, KeyLocks, Record, StoreError};

pub type JournalResult<T> = Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotAllowed(String),
    #[error("journal {0} was modified concurrently; retry the operation")]
    Conflict(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JournalError {
    pub fn status(&self) -> Status {
        match self {
            JournalError::NotFound(_) => Status::NotFound,
            JournalError::NotAllowed(_) | JournalError::Conflict(_) => Status::Conflict,
            JournalError::Store(_) => Status::InternalServerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalDoc {
    pub title: String,
    pub owner: String,
    pub objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: Uuid,
    pub title: String,
    pub owner: String,
    pub objects: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Record<JournalDoc>> for Journal {
    fn from(record: Record<JournalDoc>) -> Self {
        Journal {
            id: record.id,
            title: record.doc.title,
            owner: record.doc.owner,
            objects: record.doc.objects,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

const CREATE_LOCK_STRIPES: usize = 16;

pub struct JournalingConcept {
    journals: DocCollection<JournalDoc>,
    /// Serializes the uniqueness check and insert of `create` per (title, owner).
    create_locks: KeyLocks,
}

impl JournalingConcept {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            journals: DocCollection::new(store, collection),
            create_locks: KeyLocks::new(CREATE_LOCK_STRIPES),
        }
    }

    pub async fn create(&self, title: &str, owner: &str) -> JournalResult<Journal> {
        let _guard = self.create_locks.acquire(&[&(title, owner)]).await;
        self.assert_unique(title, owner).await?;
        let id = self
            .journals
            .create_one(&JournalDoc {
                title: title.to_string(),
                owner: owner.to_string(),
                objects: Vec::new(),
            })
            .await?;
        log::info!("created journal {id} '{title}' for {owner}");
        self.journal_by_id(id).await
    }

    pub async fn journal_by_id(&self, id: Uuid) -> JournalResult<Journal> {
        Ok(self.record(id).await?.into())
    }

    pub async fn journal_by_title(&self, title: &str, owner: &str) -> JournalResult<Journal> {
        self.journals
            .read_one(&title_filter(title, owner))
            .await?
            .map(Journal::from)
            .ok_or_else(|| {
                JournalError::NotFound(format!(
                    "No journal found with title '{title}' and owner '{owner}'"
                ))
            })
    }

    /// Every journal, newest first.
    pub async fn all_journals(&self) -> JournalResult<Vec<Journal>> {
        let mut records = self.journals.read_many(&Filter::All).await?;
        records.reverse();
        Ok(records.into_iter().map(Journal::from).collect())
    }

    pub async fn add_object(&self, id: Uuid, object: &str) -> JournalResult<()> {
        let record = self.record(id).await?;
        if record.doc.objects.iter().any(|o| o == object) {
            return Err(JournalError::NotAllowed(format!(
                "{object} already inside journal {id}"
            )));
        }
        let mut objects = record.doc.objects.clone();
        objects.push(object.to_string());
        self.write_objects(&record, objects).await
    }

    pub async fn remove_object(&self, id: Uuid, object: &str) -> JournalResult<()> {
        let record = self.record(id).await?;
        if !record.doc.objects.iter().any(|o| o == object) {
            return Err(JournalError::NotFound(format!(
                "{object} not found in journal {id}"
            )));
        }
        let objects = record
            .doc
            .objects
            .iter()
            .filter(|o| *o != object)
            .cloned()
            .collect();
        self.write_objects(&record, objects).await
    }

    pub async fn delete(&self, id: Uuid) -> JournalResult<()> {
        if !self.journals.delete_one(&Filter::Id(id)).await? {
            return Err(not_found(id));
        }
        log::info!("deleted journal {id}");
        Ok(())
    }

    async fn assert_unique(&self, title: &str, owner: &str) -> JournalResult<()> {
        if self.journals.read_one(&title_filter(title, owner)).await?.is_some() {
            return Err(JournalError::NotAllowed(format!(
                "Journal with title '{title}' and owner '{owner}' already exists"
            )));
        }
        Ok(())
    }

    async fn record(&self, id: Uuid) -> JournalResult<Record<JournalDoc>> {
        self.journals
            .read_one(&Filter::Id(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn write_objects(
        &self,
        record: &Record<JournalDoc>,
        objects: Vec<String>,
    ) -> JournalResult<()> {
        let written = self
            .journals
            .partial_update_one(&record.revision_filter(), json!({ "objects": objects }))
            .await?;
        if written {
            Ok(())
        } else {
            Err(JournalError::Conflict(record.id))
        }
    }
}

fn title_filter(title: &str, owner: &str) -> Filter {
    Filter::And(vec![Filter::eq("title", title), Filter::eq("owner", owner)])
}

fn not_found(id: Uuid) -> JournalError {
    JournalError::NotFound(format!("No journal found with id {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::testing::YieldingStore;

    fn concept() -> JournalingConcept {
        JournalingConcept::new(Arc::new(MemoryStore::new()), "journals")
    }

    #[tokio::test]
    async fn create_rejects_duplicate_title_for_same_owner() {
        let journaling = concept();
        let journal = journaling.create("Reading", "alice").await.unwrap();
        assert_eq!(journal.title, "Reading");
        assert!(journal.objects.is_empty());

        let err = journaling.create("Reading", "alice").await.unwrap_err();
        assert!(matches!(err, JournalError::NotAllowed(_)));

        journaling.create("Reading", "bob").await.unwrap();
        let found = journaling.journal_by_title("Reading", "bob").await.unwrap();
        assert_eq!(found.owner, "bob");
    }

    #[tokio::test]
    async fn concurrent_creates_of_one_title_admit_exactly_one() {
        let journaling =
            JournalingConcept::new(Arc::new(YieldingStore::new()), "journals");

        let (first, second) = tokio::join!(
            journaling.create("Reading", "alice"),
            journaling.create("Reading", "alice")
        );
        assert!(first.is_ok() != second.is_ok());
        let rejected = first.err().or(second.err()).unwrap();
        assert!(matches!(rejected, JournalError::NotAllowed(_)));

        let all = journaling.all_journals().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn objects_are_a_set() {
        let journaling = concept();
        let id = journaling.create("J", "o").await.unwrap().id;

        journaling.add_object(id, "post-1").await.unwrap();
        journaling.add_object(id, "post-2").await.unwrap();
        let err = journaling.add_object(id, "post-1").await.unwrap_err();
        assert!(matches!(err, JournalError::NotAllowed(_)));

        journaling.remove_object(id, "post-1").await.unwrap();
        let err = journaling.remove_object(id, "post-1").await.unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));

        let journal = journaling.journal_by_id(id).await.unwrap();
        assert_eq!(journal.objects, vec!["post-2".to_string()]);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_delete_is_checked() {
        let journaling = concept();
        let first = journaling.create("first", "o").await.unwrap();
        let second = journaling.create("second", "o").await.unwrap();

        let all = journaling.all_journals().await.unwrap();
        let ids: Vec<_> = all.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        journaling.delete(first.id).await.unwrap();
        assert!(matches!(
            journaling.delete(first.id).await,
            Err(JournalError::NotFound(_))
        ));
        assert!(matches!(
            journaling.add_object(first.id, "x").await,
            Err(JournalError::NotFound(_))
        ));
    }
}
