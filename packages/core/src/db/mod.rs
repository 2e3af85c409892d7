//! Database Layer
//!
//! This module holds the persistence boundary of the group tree:
//!
//! - `GroupStore` - async gateway trait (bulk load, bulk append, predicate
//!   delete, compaction)
//! - `InMemoryGroupStore` - append-log backend for tests and embedded use
//! - `GroupEvent` - domain events broadcast by the cache
//!
//! The cache never talks to a concrete database; any backend implementing
//! `GroupStore` can be injected.

mod error;
pub mod events;
mod group_store;
mod memory_store;

pub use error::StoreError;
pub use events::GroupEvent;
pub use group_store::{GroupPredicate, GroupStore};
pub use memory_store::InMemoryGroupStore;
