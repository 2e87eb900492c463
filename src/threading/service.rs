//! Threading concept: ordered chains of items kept as thread documents.
//!
//! Every public operation starts with a locator query against the thread
//! collection, decides what to do with the pure rules in [`super::splice`],
//! and finishes with exactly one single-document write. Writes to an existing
//! thread are conditional on the version the locator saw; if another writer
//! got there first the whole operation is replayed from the locate step, up
//! to `conflict_retries` times, before giving up with
//! [`ThreadingError::Conflict`].
//!
//! Mutations additionally hold the striped [`KeyLocks`] of every item whose
//! membership they read, which closes the races that version checks cannot
//! see (two callers creating separate threads that both contain one item).

use std::sync::Arc;

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ThreadingError, ThreadingResult};
use super::model::{ItemId, Location, Role, ThreadDoc};
use super::splice::{self, Splice};
use crate::config::ThreadingConfig;
use crate::store::{DocCollection, DocumentStore, Filter, KeyLocks, StoreError};

pub struct ThreadingConcept {
    threads: DocCollection<ThreadDoc>,
    locks: KeyLocks,
    config: ThreadingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created { thread: Uuid },
    Extended { thread: Uuid },
}

impl LinkOutcome {
    pub fn thread(&self) -> Uuid {
        match self {
            LinkOutcome::Created { thread } | LinkOutcome::Extended { thread } => *thread,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LinkOutcome::Created { .. } => "Created new thread".to_string(),
            LinkOutcome::Extended { .. } => "Added item to thread".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnthreadOutcome {
    Shrunk { thread: Uuid },
    Deleted { thread: Uuid },
}

impl UnthreadOutcome {
    pub fn thread(&self) -> Uuid {
        match self {
            UnthreadOutcome::Shrunk { thread } | UnthreadOutcome::Deleted { thread } => *thread,
        }
    }

    pub fn message(&self, item: &ItemId) -> String {
        match self {
            UnthreadOutcome::Shrunk { .. } => format!("Removed {item} from thread"),
            UnthreadOutcome::Deleted { .. } => {
                format!("Removed {item} from thread by deleting thread")
            }
        }
    }
}

/// Full picture of the thread containing an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    pub id: Uuid,
    pub head: ItemId,
    pub body: Vec<ItemId>,
    pub tail: ItemId,
    /// Every item in order, head first.
    pub chain: Vec<ItemId>,
    /// Role of the item the view was requested for.
    pub role: Role,
}

fn locate_filter(item: &ItemId) -> Filter {
    Filter::Or(vec![
        Filter::eq("head", item),
        Filter::contains("body", item),
        Filter::eq("tail", item),
    ])
}

impl ThreadingConcept {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        config: ThreadingConfig,
    ) -> Self {
        Self {
            threads: DocCollection::new(store, collection),
            locks: KeyLocks::new(config.lock_stripes),
            config,
        }
    }

    /// Find the thread containing `item` and the role it plays there.
    pub async fn locate(&self, item: &ItemId) -> ThreadingResult<Option<Location>> {
        let matches = self.threads.read_many(&locate_filter(item)).await?;
        if matches.len() > 1 {
            log::warn!(
                "item {} found in {} threads of '{}'; using the oldest",
                item,
                matches.len(),
                self.threads.name()
            );
        }
        let Some(record) = matches.into_iter().next() else {
            return Ok(None);
        };
        match record.doc.role_of(item) {
            Some(role) => Ok(Some(Location { record, role })),
            None => Err(StoreError::InvalidDocument(format!(
                "thread {} matched item {} but does not contain it",
                record.id, item
            ))
            .into()),
        }
    }

    async fn require(&self, item: &ItemId) -> ThreadingResult<Location> {
        self.locate(item)
            .await?
            .ok_or_else(|| ThreadingError::NotThreaded { item: item.clone() })
    }

    /// Insert `item` right after `anchor`, starting a new thread when `anchor`
    /// is not threaded yet.
    pub async fn link_after(&self, anchor: &ItemId, item: &ItemId) -> ThreadingResult<LinkOutcome> {
        if anchor == item {
            return Err(ThreadingError::AlreadyThreaded { item: item.clone() });
        }
        let _guard = self.locks.acquire(&[anchor, item]).await;

        let mut contended = Uuid::nil();
        for attempt in 0..=self.config.conflict_retries {
            if self.locate(item).await?.is_some() {
                return Err(ThreadingError::AlreadyThreaded { item: item.clone() });
            }

            let Some(location) = self.locate(anchor).await? else {
                let thread = self
                    .threads
                    .create_one(&ThreadDoc::pair(anchor.clone(), item.clone()))
                    .await?;
                log::info!("created thread {thread}: {anchor} -> {item}");
                return Ok(LinkOutcome::Created { thread });
            };

            let Some(grown) = splice::extend(location.thread(), location.role, item) else {
                return Err(ThreadingError::AlreadyThreaded {
                    item: anchor.clone(),
                });
            };

            let thread = location.record.id;
            if self.threads.replace_if_current(&location.record, &grown).await? {
                log::debug!("thread {thread}: appended {item} after {anchor}");
                return Ok(LinkOutcome::Extended { thread });
            }
            log::debug!(
                "thread {thread} changed while linking {item} (attempt {})",
                attempt + 1
            );
            contended = thread;
        }

        Err(ThreadingError::Conflict { thread: contended })
    }

    /// Take `item` out of its thread.
    pub async fn unthread(&self, item: &ItemId) -> ThreadingResult<UnthreadOutcome> {
        let _guard = self.locks.acquire(&[item]).await;

        let mut contended = Uuid::nil();
        for attempt in 0..=self.config.conflict_retries {
            let location = self.require(item).await?;
            let thread = location.record.id;

            let written = match splice::remove(location.thread(), location.role, self.config.collapse) {
                Splice::Update(shrunk) => self
                    .threads
                    .replace_if_current(&location.record, &shrunk)
                    .await?
                    .then_some(UnthreadOutcome::Shrunk { thread }),
                Splice::Delete => self
                    .threads
                    .delete_if_current(&location.record)
                    .await?
                    .then_some(UnthreadOutcome::Deleted { thread }),
            };

            if let Some(outcome) = written {
                log::debug!("thread {thread}: removed {item} ({outcome:?})");
                return Ok(outcome);
            }
            log::debug!(
                "thread {thread} changed while removing {item} (attempt {})",
                attempt + 1
            );
            contended = thread;
        }

        Err(ThreadingError::Conflict { thread: contended })
    }

    /// Item right after `item`, or `None` at the tail.
    pub async fn next(&self, item: &ItemId) -> ThreadingResult<Option<ItemId>> {
        let location = self.require(item).await?;
        Ok(splice::next(location.thread(), location.role))
    }

    /// Item right before `item`, or `None` at the head.
    pub async fn prev(&self, item: &ItemId) -> ThreadingResult<Option<ItemId>> {
        let location = self.require(item).await?;
        Ok(splice::prev(location.thread(), location.role))
    }

    pub async fn thread_of(&self, item: &ItemId) -> ThreadingResult<ThreadView> {
        let Location { record, role } = self.require(item).await?;
        let chain = record.doc.chain();
        Ok(ThreadView {
            id: record.id,
            head: record.doc.head,
            body: record.doc.body,
            tail: record.doc.tail,
            chain,
            role,
        })
    }
}
