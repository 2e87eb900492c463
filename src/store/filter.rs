//! Query filters understood by every document store backend.

use serde_json::Value;
use uuid::Uuid;

use super::StoredDocument;

/// Predicate over stored documents.
///
/// `Eq` and `Contains` address top-level body fields only. `Eq` is exact
/// equality of the field value; `Contains` tests membership in an array field.
/// Both compare structured values (arrays, objects) as whole values.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(Uuid),
    Version(i64),
    Eq(String, Value),
    Contains(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    /// Evaluate the filter against an in-memory document.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => doc.id == *id,
            Filter::Version(version) => doc.version == *version,
            Filter::Eq(field, value) => doc.body.get(field) == Some(value),
            Filter::Contains(field, value) => doc
                .body
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}
