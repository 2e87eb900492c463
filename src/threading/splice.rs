//! Pure splicing rules for thread documents.
//!
//! Nothing in here touches the store. Each function takes the current thread
//! and the role of the item being operated on, and returns the document the
//! caller should write (or the neighbor it should report). Head and tail
//! promotion is driven by matching on the body slice: empty, or with a
//! first/last element split off.

use super::model::{CollapsePolicy, ItemId, Role, ThreadDoc};

/// Single write that completes a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splice {
    Update(ThreadDoc),
    Delete,
}

/// Thread after appending `item` behind `anchor`.
///
/// Returns `None` when `anchor` already has a successor (it is the head of a
/// multi-element thread or a body element); growth only happens at the tail.
pub fn extend(thread: &ThreadDoc, anchor: Role, item: &ItemId) -> Option<ThreadDoc> {
    match anchor {
        Role::Sole => Some(ThreadDoc::pair(thread.head.clone(), item.clone())),
        Role::Tail => {
            let mut body = thread.body.clone();
            body.push(thread.tail.clone());
            Some(ThreadDoc::new(thread.head.clone(), body, item.clone()))
        }
        Role::Head | Role::Body(_) => None,
    }
}

/// Write needed to take the item at `role` out of `thread`.
pub fn remove(thread: &ThreadDoc, role: Role, policy: CollapsePolicy) -> Splice {
    match (role, thread.body.as_slice()) {
        (Role::Sole, _) => Splice::Delete,
        (Role::Head, []) => collapse(&thread.tail, policy),
        (Role::Head, [first, rest @ ..]) => Splice::Update(ThreadDoc::new(
            first.clone(),
            rest.to_vec(),
            thread.tail.clone(),
        )),
        (Role::Tail, []) => collapse(&thread.head, policy),
        (Role::Tail, [rest @ .., last]) => Splice::Update(ThreadDoc::new(
            thread.head.clone(),
            rest.to_vec(),
            last.clone(),
        )),
        (Role::Body(index), body) => {
            let body = body
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, item)| item.clone())
                .collect();
            Splice::Update(ThreadDoc::new(
                thread.head.clone(),
                body,
                thread.tail.clone(),
            ))
        }
    }
}

fn collapse(survivor: &ItemId, policy: CollapsePolicy) -> Splice {
    match policy {
        CollapsePolicy::Dissolve => Splice::Delete,
        CollapsePolicy::KeepSurvivor => Splice::Update(ThreadDoc::singleton(survivor.clone())),
    }
}

pub fn next(thread: &ThreadDoc, role: Role) -> Option<ItemId> {
    match role {
        Role::Sole | Role::Tail => None,
        Role::Head => Some(thread.body.first().unwrap_or(&thread.tail).clone()),
        Role::Body(index) => Some(thread.body.get(index + 1).unwrap_or(&thread.tail).clone()),
    }
}

pub fn prev(thread: &ThreadDoc, role: Role) -> Option<ItemId> {
    match role {
        Role::Sole | Role::Head => None,
        // Last body element, or the head when the body is empty.
        Role::Tail => Some(thread.body.last().unwrap_or(&thread.head).clone()),
        Role::Body(index) => Some(
            index
                .checked_sub(1)
                .and_then(|p| thread.body.get(p))
                .unwrap_or(&thread.head)
                .clone(),
        ),
    }
}
