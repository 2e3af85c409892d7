//! Group Data Structures
//!
//! This module defines the `Group` entity, the single node type of the
//! organizational hierarchy, together with the small value types that travel
//! alongside it (office references and breadcrumb entries).
//!
//! # Tree Shape
//!
//! - **Main group**: exactly one group has `main = true`; it is the root and
//!   carries no parent.
//! - **Depth**: `depth_level` of every non-root group equals its parent's
//!   depth plus one. The main group's depth is authoritative.
//! - **Office groups**: at most one group per office has `office_group = true`.
//!
//! # Examples
//!
//! ```rust
//! use grouptree_core::models::Group;
//!
//! let root = Group::new_main("Company");
//! let branch = Group::new_child("Branch", &root);
//! assert_eq!(branch.parent_id, Some(root.id));
//! assert_eq!(branch.depth_level, root.depth_level + 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque, immutable group identifier
pub type GroupId = Uuid;

/// Shape errors for a single group, checked before it enters the cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupValidationError {
    #[error("Group {id} has an empty name")]
    EmptyName { id: GroupId },

    #[error("Main group {id} cannot have a parent")]
    MainWithParent { id: GroupId },

    #[error("Group {id} has no parent but is not the main group")]
    MissingParent { id: GroupId },

    #[error("Group {id} cannot be its own parent")]
    SelfParent { id: GroupId },

    #[error("Group {id} has negative depth {depth}")]
    NegativeDepth { id: GroupId, depth: i32 },

    #[error("Office group {id} does not reference an office")]
    OfficeGroupWithoutOffice { id: GroupId },
}

/// A node in the organizational hierarchy.
///
/// Devices and sub-groups attach to groups. The persistent store keeps one
/// row per version; `modified_at` orders versions of the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique identifier, never changes after creation
    pub id: GroupId,

    /// Display label
    pub name: String,

    /// Parent group, `None` only for the main group
    pub parent_id: Option<GroupId>,

    /// Distance from the main group
    pub depth_level: i32,

    /// Whether this group is the root of the tree
    #[serde(default)]
    pub main: bool,

    /// Inactive groups stay readable but cannot receive children
    #[serde(default = "default_active")]
    pub active: bool,

    /// Whether this group represents a physical office
    #[serde(default)]
    pub office_group: bool,

    /// Office this group belongs to (required when `office_group` is set)
    #[serde(default, rename = "office")]
    pub office_id: Option<Uuid>,

    /// Version column for append-style storage
    pub modified_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Group {
    /// Create the main (root) group at depth 0
    pub fn new_main(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
            depth_level: 0,
            main: true,
            active: true,
            office_group: false,
            office_id: None,
            modified_at: Utc::now(),
        }
    }

    /// Create an active group directly under `parent`, one level deeper
    pub fn new_child(name: impl Into<String>, parent: &Group) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: Some(parent.id),
            depth_level: parent.depth_level + 1,
            main: false,
            active: true,
            office_group: false,
            office_id: None,
            modified_at: Utc::now(),
        }
    }

    /// Mark this group as the office group of `office`
    pub fn with_office(mut self, office: &OfficeRef) -> Self {
        self.office_group = true;
        self.office_id = Some(office.id);
        self
    }

    /// Mark this group inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this group has no parent link
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Bump the version column after an in-place change
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Check the shape rules a single group must satisfy on its own.
    ///
    /// Rules that involve other groups (exactly one main group, office
    /// uniqueness, acyclicity) are enforced by the cache.
    pub fn validate(&self) -> Result<(), GroupValidationError> {
        if self.name.trim().is_empty() {
            return Err(GroupValidationError::EmptyName { id: self.id });
        }

        if self.depth_level < 0 {
            return Err(GroupValidationError::NegativeDepth {
                id: self.id,
                depth: self.depth_level,
            });
        }

        match (self.main, self.parent_id) {
            (true, Some(_)) => return Err(GroupValidationError::MainWithParent { id: self.id }),
            (false, None) => return Err(GroupValidationError::MissingParent { id: self.id }),
            (_, Some(parent)) if parent == self.id => {
                return Err(GroupValidationError::SelfParent { id: self.id })
            }
            _ => {}
        }

        if self.office_group && self.office_id.is_none() {
            return Err(GroupValidationError::OfficeGroupWithoutOffice { id: self.id });
        }

        Ok(())
    }
}

/// Reference to an office, used to locate its office group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeRef {
    pub id: Uuid,
    pub name: String,
}

impl OfficeRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One element of a root-to-leaf breadcrumb path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: Uuid,
    pub name: String,
}

impl TreeEntry {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Leaf entry for a device attached to a group, labelled `"name (host)"`
    pub fn device(id: Uuid, name: &str, host: &str) -> Self {
        Self {
            id,
            name: format!("{} ({})", name, host),
        }
    }
}

impl From<&Group> for TreeEntry {
    fn from(group: &Group) -> Self {
        Self::new(group.id, group.name.clone())
    }
}

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;
