//! Domain Events for the group tree
//!
//! The cache emits these after each successful operation using tokio's
//! broadcast channel, so other parts of the process can react to tree changes
//! without holding the cache lock.

use crate::models::{Group, GroupId};

/// Domain events emitted by `TreeCache`
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    /// A group entered or replaced its entry in the cache
    Upserted(Group),

    /// A group was deleted from storage and cache
    Deleted { id: GroupId },

    /// All non-main groups were removed
    Reset { removed: usize },

    /// Pending writes reached the store
    Flushed { count: usize, compacted: bool },

    /// The cache was replaced by a full re-read of the store
    Reloaded { count: usize },

    /// A failed flush was reconciled by dropping pending writes and reloading
    Reconciled { discarded: usize },
}

impl GroupEvent {
    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            GroupEvent::Upserted(_) => "group:upserted",
            GroupEvent::Deleted { .. } => "group:deleted",
            GroupEvent::Reset { .. } => "groups:reset",
            GroupEvent::Flushed { .. } => "groups:flushed",
            GroupEvent::Reloaded { .. } => "groups:reloaded",
            GroupEvent::Reconciled { .. } => "groups:reconciled",
        }
    }
}
