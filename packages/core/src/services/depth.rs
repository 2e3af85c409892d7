//! Depth recalculation after a reparent
//!
//! Walks the subtree below a group and rewrites `depth_level` so that every
//! child sits exactly one level below its parent. Changed groups are merged
//! into the pending-write queue.
//!
//! There is no cycle detection here. Callers must only invoke
//! `recalc_from` after `consistency::check_reparent` accepted the change
//! that made the recalculation necessary.

use crate::models::GroupId;
use crate::services::group_table::GroupTable;
use crate::services::traversal::children_of;

/// Recompute depths below `root_id`, starting from its current depth.
///
/// Returns the number of groups whose depth changed. Unknown `root_id`
/// changes nothing.
pub fn recalc_from(groups: &mut GroupTable, pending: &mut GroupTable, root_id: GroupId) -> usize {
    let Some(root_depth) = groups.get(&root_id).map(|g| g.depth_level) else {
        return 0;
    };
    set_child_depth(groups, pending, root_id, root_depth + 1)
}

fn set_child_depth(
    groups: &mut GroupTable,
    pending: &mut GroupTable,
    parent_id: GroupId,
    depth: i32,
) -> usize {
    let children: Vec<(GroupId, i32)> = children_of(groups, parent_id)
        .map(|g| (g.id, g.depth_level))
        .collect();

    let mut changed = 0;
    for (child_id, current_depth) in children {
        if current_depth != depth {
            if let Some(child) = groups.get_mut(&child_id) {
                child.depth_level = depth;
                child.touch();
                pending.upsert(child.clone());
                changed += 1;
            }
        }
        changed += set_child_depth(groups, pending, child_id, depth + 1);
    }
    changed
}
