//! Item threading module
//!
//! Maintains disjoint ordered chains ("threads") of opaque item identifiers on
//! top of a document store. Each thread is one document holding a `head`, an
//! ordered `body` and a `tail`; there is no resident in-memory graph, and every
//! question about an item starts with a query for the one thread containing it.
//!
//! ## Module Structure
//!
//! - `model`: item ids, thread documents, roles and the collapse policy
//! - `splice`: pure insertion/removal/neighbor rules on a thread document
//! - `service`: the [`ThreadingConcept`] tying locator, splicer and store together
//! - `error`: [`ThreadingError`]

pub mod error;
pub mod model;
pub mod service;
pub mod splice;

pub use error::{ThreadingError, ThreadingResult};
pub use model::{CollapsePolicy, ItemId, Location, Role, ThreadDoc};
pub use service::{LinkOutcome, ThreadView, ThreadingConcept, UnthreadOutcome};
