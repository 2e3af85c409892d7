//! GroupStore Trait - Persistence Gateway
//!
//! This module defines the `GroupStore` trait, the boundary between the
//! in-memory tree cache and whatever durable storage backs it.
//!
//! # Design Decisions
//!
//! 1. **Append-Style Writes**: `bulk_append` adds one row per group; the store
//!    is not required to deduplicate. Callers avoid duplicate appends.
//! 2. **Final Reads**: `load_all_ordered_by_depth` returns one current row per
//!    id, ordered so that parents come before children.
//! 3. **Explicit Compaction**: collapsing the append log is expensive and only
//!    happens when the cache asks for it.
//! 4. **Error Handling**: Uses `anyhow::Result` for flexible error context
//!
//! # Examples
//!
//! ```rust
//! use grouptree_core::db::{GroupStore, InMemoryGroupStore};
//! use grouptree_core::models::Group;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = InMemoryGroupStore::new();
//! let root = Group::new_main("Company");
//! store.bulk_append(vec![root.clone()]).await?;
//!
//! let groups = store.load_all_ordered_by_depth().await?;
//! assert_eq!(groups, vec![root]);
//! # Ok(())
//! # }
//! ```

use crate::models::{Group, GroupId};
use anyhow::Result;
use async_trait::async_trait;

/// Row filter for `GroupStore::delete_where`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPredicate {
    /// Rows with this id
    Id(GroupId),
    /// Rows with `main = false`
    NonMain,
}

impl GroupPredicate {
    /// Whether `group` is selected by this predicate
    pub fn matches(&self, group: &Group) -> bool {
        match self {
            GroupPredicate::Id(id) => group.id == *id,
            GroupPredicate::NonMain => !group.main,
        }
    }
}

/// Abstraction over group persistence
///
/// Implementations must be `Send + Sync`: the cache holds the store behind an
/// `Arc` and calls it from whichever task owns the cache lock.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Load every group, ascending by `depth_level`
    ///
    /// Parents must precede their children. Failure at process start is
    /// fatal to the caller.
    async fn load_all_ordered_by_depth(&self) -> Result<Vec<Group>>;

    /// Append one row per group
    async fn bulk_append(&self, groups: Vec<Group>) -> Result<()>;

    /// Delete every row matching `predicate`, returning the number removed
    async fn delete_where(&self, predicate: GroupPredicate) -> Result<usize>;

    /// Collapse the append log to one current row per id
    async fn compact(&self) -> Result<()>;
}
