//! Permissioning concept: one permission log per party listing granted actions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{DocCollection, DocumentStore, Filter, KeyLocks, Record, StoreError};

pub type PermissionResult<T> = Result<T, PermissionError>;

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotAllowed(String),
    #[error("permission log {0} was modified concurrently; retry the operation")]
    Conflict(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PermissionError {
    pub fn status(&self) -> Status {
        match self {
            PermissionError::NotFound(_) => Status::NotFound,
            PermissionError::NotAllowed(_) | PermissionError::Conflict(_) => Status::Conflict,
            PermissionError::Store(_) => Status::InternalServerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDoc {
    pub party: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionLog {
    pub id: Uuid,
    pub party: String,
    pub actions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Record<PermissionDoc>> for PermissionLog {
    fn from(record: Record<PermissionDoc>) -> Self {
        PermissionLog {
            id: record.id,
            party: record.doc.party,
            actions: record.doc.actions,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

const CREATE_LOCK_STRIPES: usize = 16;

pub struct PermissioningConcept {
    perms: DocCollection<PermissionDoc>,
    create_locks: KeyLocks,
}

impl PermissioningConcept {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            perms: DocCollection::new(store, collection),
            create_locks: KeyLocks::new(CREATE_LOCK_STRIPES),
        }
    }

    pub async fn create_party(&self, party: &str) -> PermissionResult<PermissionLog> {
        let _guard = self.create_locks.acquire(&[party]).await;
        if self.perms.read_one(&party_filter(party)).await?.is_some() {
            return Err(PermissionError::NotAllowed(format!(
                "Party '{party}' already has a permission log"
            )));
        }
        let id = self
            .perms
            .create_one(&PermissionDoc {
                party: party.to_string(),
                actions: Vec::new(),
            })
            .await?;
        log::info!("created permission log {id} for '{party}'");
        Ok(self.record(id).await?.into())
    }

    pub async fn log(&self, id: Uuid) -> PermissionResult<PermissionLog> {
        Ok(self.record(id).await?.into())
    }

    pub async fn party_from_id(&self, id: Uuid) -> PermissionResult<String> {
        Ok(self.record(id).await?.doc.party)
    }

    pub async fn id_from_party(&self, party: &str) -> PermissionResult<Uuid> {
        self.perms
            .read_one(&party_filter(party))
            .await?
            .map(|record| record.id)
            .ok_or_else(|| {
                PermissionError::NotFound(format!("No permission log for party '{party}'"))
            })
    }

    pub async fn permissions(&self, id: Uuid) -> PermissionResult<Vec<String>> {
        Ok(self.record(id).await?.doc.actions)
    }

    pub async fn grant(&self, id: Uuid, action: &str) -> PermissionResult<()> {
        let record = self.record(id).await?;
        if record.doc.actions.iter().any(|a| a == action) {
            return Err(PermissionError::NotAllowed(format!(
                "Party '{}' already has permission '{action}'",
                record.doc.party
            )));
        }
        let mut actions = record.doc.actions.clone();
        actions.push(action.to_string());
        self.write_actions(&record, actions).await?;
        log::info!("granted '{action}' to '{}'", record.doc.party);
        Ok(())
    }

    pub async fn revoke(&self, id: Uuid, action: &str) -> PermissionResult<()> {
        let record = self.record(id).await?;
        if !record.doc.actions.iter().any(|a| a == action) {
            return Err(PermissionError::NotAllowed(format!(
                "Party '{}' does not have permission '{action}'",
                record.doc.party
            )));
        }
        let actions = record
            .doc
            .actions
            .iter()
            .filter(|a| *a != action)
            .cloned()
            .collect();
        self.write_actions(&record, actions).await?;
        log::info!("revoked '{action}' from '{}'", record.doc.party);
        Ok(())
    }

    pub async fn has_permission(&self, id: Uuid, action: &str) -> PermissionResult<bool> {
        Ok(self.record(id).await?.doc.actions.iter().any(|a| a == action))
    }

    pub async fn remove_party(&self, id: Uuid) -> PermissionResult<()> {
        if !self.perms.delete_one(&Filter::Id(id)).await? {
            return Err(not_found(id));
        }
        log::info!("removed permission log {id}");
        Ok(())
    }

    async fn record(&self, id: Uuid) -> PermissionResult<Record<PermissionDoc>> {
        self.perms
            .read_one(&Filter::Id(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn write_actions(
        &self,
        record: &Record<PermissionDoc>,
        actions: Vec<String>,
    ) -> PermissionResult<()> {
        let written = self
            .perms
            .partial_update_one(&record.revision_filter(), json!({ "actions": actions }))
            .await?;
        if written {
            Ok(())
        } else {
            Err(PermissionError::Conflict(record.id))
        }
    }
}

fn party_filter(party: &str) -> Filter {
    Filter::eq("party", party)
}

fn not_found(id: Uuid) -> PermissionError {
    PermissionError::NotFound(format!("No permission log with id {id}"))
}
