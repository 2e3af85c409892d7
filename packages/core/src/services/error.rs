//! Service Layer Error Types
//!
//! This module defines the error kinds surfaced by the tree cache. Callers
//! (the HTTP layer) map these kinds to user-facing, possibly localized text.

use crate::db::StoreError;
use crate::models::{GroupId, GroupValidationError};
use thiserror::Error;
use uuid::Uuid;

fn action(cascading: &bool) -> &'static str {
    if *cascading {
        "Cannot relink subgroups"
    } else {
        "Cannot change parent group"
    }
}

/// Reason a structural change was refused by the consistency guard
///
/// `cascading` is set when the change relinks the children of a group being
/// deleted or deactivated, and only changes the wording.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReparentRejection {
    /// The tree has no main group to compare against
    #[error("Group structure is broken: main group not found")]
    MainGroupMissing,

    /// Cascading relinks may not target the main group
    #[error("Cannot relink subgroups: moving into the main group is not allowed ({target})")]
    RelinkIntoMain { target: GroupId },

    /// A group cannot parent itself
    #[error("{}: group {id} cannot be its own parent", action(.cascading))]
    SelfParent { id: GroupId, cascading: bool },

    /// The main group never moves
    #[error("Cannot change parent group: main group {id} cannot be moved")]
    MainGroupImmutable { id: GroupId },

    /// The main group is never deleted or deactivated, so its children are
    /// never relinked
    #[error("Cannot relink subgroups: main group {id} is never removed")]
    MainGroupChildren { id: GroupId },

    /// The target parent is unknown or inactive
    #[error("{}: group {target} does not exist or is inactive", action(.cascading))]
    TargetUnavailable { target: GroupId, cascading: bool },

    /// The target parent sits below the moved group
    #[error("{}: group {target} is a subgroup of {id}", action(.cascading))]
    TargetIsDescendant {
        id: GroupId,
        target: GroupId,
        cascading: bool,
    },
}

/// Tree cache errors
#[derive(Error, Debug)]
pub enum TreeCacheError {
    /// No group with this id in the cache
    #[error("Group not found: {id}")]
    GroupNotFound { id: GroupId },

    /// Invariant violation: the tree has no main group
    #[error("Group structure is broken: main group not found")]
    MainGroupMissing,

    /// Invariant violation: an office has no office group
    #[error("Group structure is broken: office group not found (office {office_name})")]
    OfficeGroupMissing { office_id: Uuid, office_name: String },

    /// A second main group was submitted
    #[error("Main group already exists: {existing} (rejected {rejected})")]
    DuplicateMainGroup { existing: GroupId, rejected: GroupId },

    /// A second office group was submitted for the same office
    #[error("Office {office_id} already has office group {existing} (rejected {rejected})")]
    DuplicateOfficeGroup {
        office_id: Uuid,
        existing: GroupId,
        rejected: GroupId,
    },

    /// Structural change refused by the consistency guard
    #[error("{0}")]
    Rejected(#[from] ReparentRejection),

    /// Depth does not sit one level below the parent
    #[error("Group {id} has depth {actual}, expected {expected}")]
    DepthMismatch {
        id: GroupId,
        expected: i32,
        actual: i32,
    },

    /// Group failed shape validation
    #[error("Group validation failed: {0}")]
    Validation(#[from] GroupValidationError),

    /// Store call failed; the cache was left unchanged
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Flush failed; pending writes were discarded
    ///
    /// `reconciled` is false when the follow-up reload failed too and the cache
    /// still holds its pre-flush state.
    #[error("Flush failed, {discarded} pending write(s) discarded (reconciled: {reconciled}): {source}")]
    FlushFailed {
        #[source]
        source: StoreError,
        discarded: usize,
        reconciled: bool,
    },

    /// Initial load failed; the process cannot run without a tree
    #[error("Failed to load group tree at startup: {0}")]
    StartupLoad(#[source] StoreError),

    /// Invalid cache configuration
    #[error("Invalid tree cache configuration: {0}")]
    InvalidConfig(String),
}

impl TreeCacheError {
    /// Create a group not found error
    pub fn group_not_found(id: GroupId) -> Self {
        Self::GroupNotFound { id }
    }

    /// Create an office group missing error
    pub fn office_group_missing(office_id: Uuid, office_name: impl Into<String>) -> Self {
        Self::OfficeGroupMissing {
            office_id,
            office_name: office_name.into(),
        }
    }

    /// Whether this error reports a broken tree invariant
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::MainGroupMissing
                | Self::OfficeGroupMissing { .. }
                | Self::Rejected(ReparentRejection::MainGroupMissing)
        )
    }
}
