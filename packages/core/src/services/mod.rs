//! Business Services
//!
//! This module contains the tree cache and the algorithms it is built from:
//!
//! - `TreeCache` - in-memory mirror, pending-write queue, mutations, flushing
//! - `consistency` - validation of parent changes (cycle prevention)
//! - `depth` - depth recalculation below a moved group
//! - `traversal` - child, ancestor and descendant queries
//! - `GroupTable` - id-indexed group storage shared by all of the above
//!
//! The algorithm modules are pure functions over a `GroupTable`; `TreeCache`
//! owns the lock and calls them under it.

pub mod consistency;
pub mod depth;
pub mod error;
mod group_table;
pub mod traversal;
pub mod tree_cache;

pub use error::{ReparentRejection, TreeCacheError};
pub use group_table::GroupTable;
pub use tree_cache::{CacheStats, TreeCache};
