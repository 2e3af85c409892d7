//! Tree traversal queries
//!
//! Read-only queries over a `GroupTable`: lookups, ancestor breadcrumbs and
//! descendant enumeration. They take the table by reference so the cache can
//! run them under whichever guard it already holds; the consistency guard and
//! the depth recalculator use them from inside write operations.

use crate::models::{Group, GroupId, OfficeRef, TreeEntry};
use crate::services::error::TreeCacheError;
use crate::services::group_table::GroupTable;
use std::collections::HashSet;

/// Direct children of `parent_id`, in table order
pub fn children_of<'a>(
    table: &'a GroupTable,
    parent_id: GroupId,
) -> impl Iterator<Item = &'a Group> + 'a {
    table
        .iter()
        .filter(move |g| g.parent_id == Some(parent_id))
}

/// All direct children of `parent_id`; empty when there are none
pub fn by_parent_id(table: &GroupTable, parent_id: GroupId) -> Vec<Group> {
    children_of(table, parent_id).cloned().collect()
}

pub fn by_id(table: &GroupTable, id: GroupId) -> Option<Group> {
    table.get(&id).cloned()
}

/// Id of the main group.
///
/// Only the first match is returned; a second main group is not detected here.
pub fn main_group_id(table: &GroupTable) -> Result<GroupId, TreeCacheError> {
    table
        .iter()
        .find(|g| g.main)
        .map(|g| g.id)
        .ok_or(TreeCacheError::MainGroupMissing)
}

/// Id of the office group for `office`
pub fn office_group_id(table: &GroupTable, office: &OfficeRef) -> Result<GroupId, TreeCacheError> {
    table
        .iter()
        .find(|g| g.office_group && g.office_id == Some(office.id))
        .map(|g| g.id)
        .ok_or_else(|| TreeCacheError::office_group_missing(office.id, office.name.clone()))
}

/// Root-to-leaf breadcrumb ending with `group_id` followed by `leaf`.
///
/// Returns an empty path when `group_id` is unknown. The upward walk stops at
/// the root, at a parent missing from the table, or at a repeated ancestor.
pub fn ancestor_path(table: &GroupTable, group_id: GroupId, leaf: TreeEntry) -> Vec<TreeEntry> {
    let Some(group) = table.get(&group_id) else {
        return Vec::new();
    };

    let mut seen = HashSet::from([group.id]);
    // Built leaf-first, reversed at the end
    let mut path = vec![leaf, TreeEntry::from(group)];

    let mut next = group.parent_id;
    while let Some(parent_id) = next {
        let Some(parent) = table.get(&parent_id) else {
            break;
        };
        if !seen.insert(parent.id) {
            tracing::warn!("Cycle detected above group {} at {}", group_id, parent.id);
            break;
        }
        path.push(TreeEntry::from(parent));
        next = parent.parent_id;
    }

    path.reverse();
    path
}

/// Every id reachable below `group_id`, pre-order depth-first.
///
/// `group_id` itself is not included.
pub fn descendant_set(table: &GroupTable, group_id: GroupId) -> Vec<GroupId> {
    let mut found = Vec::new();
    let mut visited = HashSet::from([group_id]);
    collect_descendants(table, group_id, &mut found, &mut visited);
    found
}

fn collect_descendants(
    table: &GroupTable,
    parent_id: GroupId,
    found: &mut Vec<GroupId>,
    visited: &mut HashSet<GroupId>,
) {
    for child in children_of(table, parent_id) {
        if !visited.insert(child.id) {
            continue;
        }
        found.push(child.id);
        collect_descendants(table, child.id, found, visited);
    }
}

#[cfg(test)]
#[path = "traversal_test.rs"]
mod traversal_test;
