//! Data structures for thread documents and item positions.

use std::fmt;

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ThreadingError;
use crate::store::Record;

/// Opaque identifier of a threadable item.
///
/// Any non-empty string is accepted; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ThreadingError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ThreadingError::InvalidItem);
        }
        Ok(ItemId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ItemId> for Value {
    fn from(item: &ItemId) -> Self {
        Value::String(item.0.clone())
    }
}

/// Persisted shape of one thread.
///
/// A one-element thread stores its only item as both `head` and `tail` with
/// an empty `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDoc {
    pub head: ItemId,
    pub body: Vec<ItemId>,
    pub tail: ItemId,
}

impl ThreadDoc {
    pub fn new(head: ItemId, body: Vec<ItemId>, tail: ItemId) -> Self {
        Self { head, body, tail }
    }

    pub fn pair(head: ItemId, tail: ItemId) -> Self {
        Self::new(head, Vec::new(), tail)
    }

    pub fn singleton(item: ItemId) -> Self {
        Self::new(item.clone(), Vec::new(), item)
    }

    pub fn is_singleton(&self) -> bool {
        self.body.is_empty() && self.head == self.tail
    }

    /// Items in chain order, head first.
    pub fn chain(&self) -> Vec<ItemId> {
        if self.is_singleton() {
            return vec![self.head.clone()];
        }
        let mut chain = Vec::with_capacity(self.body.len() + 2);
        chain.push(self.head.clone());
        chain.extend(self.body.iter().cloned());
        chain.push(self.tail.clone());
        chain
    }

    /// Role `item` plays in this thread, if any.
    pub fn role_of(&self, item: &ItemId) -> Option<Role> {
        if self.is_singleton() {
            return (self.head == *item).then_some(Role::Sole);
        }
        if self.head == *item {
            Some(Role::Head)
        } else if self.tail == *item {
            Some(Role::Tail)
        } else {
            self.body.iter().position(|b| b == item).map(Role::Body)
        }
    }
}

/// Position of an item inside its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Role {
    Head,
    /// Zero-based index into the body.
    Body(usize),
    Tail,
    /// Only element of a one-element thread.
    Sole,
}

/// Result of a locator query: the thread record plus the item's role in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub record: Record<ThreadDoc>,
    pub role: Role,
}

impl Location {
    pub fn thread(&self) -> &ThreadDoc {
        &self.record.doc
    }
}

/// What happens to the survivor when a two-element thread loses an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsePolicy {
    /// Delete the thread; the survivor is no longer threaded.
    #[default]
    Dissolve,
    /// Keep the survivor as a one-element thread.
    KeepSurvivor,
}

impl std::str::FromStr for CollapsePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dissolve" => Ok(CollapsePolicy::Dissolve),
            "keep-survivor" | "keep_survivor" | "keep" => Ok(CollapsePolicy::KeepSurvivor),
            other => Err(format!(
                "invalid collapse policy '{other}'; expected 'dissolve' or 'keep-survivor'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[test]
    fn item_ids_are_trimmed_and_non_empty() {
        assert_eq!(id("  a ").as_str(), "a");
        assert!(matches!(ItemId::new("   "), Err(ThreadingError::InvalidItem)));
    }

    #[test]
    fn roles_cover_every_position() {
        let t = ThreadDoc::new(id("a"), vec![id("b"), id("c")], id("d"));
        assert_eq!(t.role_of(&id("a")), Some(Role::Head));
        assert_eq!(t.role_of(&id("b")), Some(Role::Body(0)));
        assert_eq!(t.role_of(&id("c")), Some(Role::Body(1)));
        assert_eq!(t.role_of(&id("d")), Some(Role::Tail));
        assert_eq!(t.role_of(&id("e")), None);
        assert_eq!(t.chain().len(), 4);
    }

    #[test]
    fn singleton_is_sole_not_head_or_tail() {
        let t = ThreadDoc::singleton(id("x"));
        assert_eq!(t.role_of(&id("x")), Some(Role::Sole));
        assert_eq!(t.chain(), vec![id("x")]);
    }

    #[test]
    fn role_serializes_as_tagged_variant() {
        assert_eq!(
            serde_json::to_value(Role::Body(2)).unwrap(),
            serde_json::json!({ "kind": "body", "index": 2 })
        );
        assert_eq!(
            serde_json::to_value(Role::Tail).unwrap(),
            serde_json::json!({ "kind": "tail" })
        );
    }

    #[test]
    fn parses_collapse_policy() {
        assert_eq!("dissolve".parse(), Ok(CollapsePolicy::Dissolve));
        assert_eq!("Keep-Survivor".parse(), Ok(CollapsePolicy::KeepSurvivor));
        assert!("merge".parse::<CollapsePolicy>().is_err());
    }
}
