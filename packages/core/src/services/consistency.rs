//! Consistency guard for structural changes
//!
//! Every change to a group's `parent_id` must pass `check_reparent` first.
//! It is the only protection against cycles: the depth recalculator recurses
//! without any cycle detection of its own.

use crate::models::GroupId;
use crate::services::error::ReparentRejection;
use crate::services::group_table::GroupTable;
use crate::services::traversal::{descendant_set, main_group_id};

/// Check whether `node_id` may be moved under `target_id`.
///
/// `cascading` marks a relink of the children of a group that is being
/// deleted or deactivated; such relinks may not target the main group.
/// Returns `None` when the move is allowed.
pub fn check_reparent(
    table: &GroupTable,
    node_id: GroupId,
    target_id: GroupId,
    cascading: bool,
) -> Option<ReparentRejection> {
    if cascading {
        let main_id = match main_group_id(table) {
            Ok(id) => id,
            Err(_) => return Some(ReparentRejection::MainGroupMissing),
        };
        if target_id == main_id {
            return Some(ReparentRejection::RelinkIntoMain { target: target_id });
        }
    }

    if node_id == target_id {
        return Some(ReparentRejection::SelfParent {
            id: node_id,
            cascading,
        });
    }

    if table.get(&node_id).is_some_and(|g| g.main) {
        return Some(if cascading {
            ReparentRejection::MainGroupChildren { id: node_id }
        } else {
            ReparentRejection::MainGroupImmutable { id: node_id }
        });
    }

    if !table.get(&target_id).is_some_and(|g| g.active) {
        return Some(ReparentRejection::TargetUnavailable {
            target: target_id,
            cascading,
        });
    }

    if descendant_set(table, node_id).contains(&target_id) {
        return Some(ReparentRejection::TargetIsDescendant {
            id: node_id,
            target: target_id,
            cascading,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;

    /// root → a → b → c, root → d (inactive)
    fn tree() -> (GroupTable, Group, Group, Group, Group, Group) {
        let root = Group::new_main("Root");
        let a = Group::new_child("A", &root);
        let b = Group::new_child("B", &a);
        let c = Group::new_child("C", &b);
        let d = Group::new_child("D", &root).inactive();
        let table = GroupTable::from_groups(vec![
            root.clone(),
            a.clone(),
            d.clone(),
            b.clone(),
            c.clone(),
        ]);
        (table, root, a, b, c, d)
    }

    #[test]
    fn test_accepts_move_to_active_non_descendant() {
        let (table, root, a, _, c, _) = tree();
        assert_eq!(check_reparent(&table, c.id, root.id, false), None);
        assert_eq!(check_reparent(&table, c.id, a.id, false), None);
    }

    #[test]
    fn test_rejects_self_parent() {
        let (table, _, a, _, _, _) = tree();
        assert_eq!(
            check_reparent(&table, a.id, a.id, false),
            Some(ReparentRejection::SelfParent {
                id: a.id,
                cascading: false
            })
        );
    }

    #[test]
    fn test_rejects_every_descendant_as_target() {
        let (table, _, a, b, c, _) = tree();
        for target in [b.id, c.id] {
            assert_eq!(
                check_reparent(&table, a.id, target, false),
                Some(ReparentRejection::TargetIsDescendant {
                    id: a.id,
                    target,
                    cascading: false
                })
            );
        }
    }

    #[test]
    fn test_rejects_inactive_or_missing_target() {
        let (table, _, _, b, _, d) = tree();
        assert!(matches!(
            check_reparent(&table, b.id, d.id, false),
            Some(ReparentRejection::TargetUnavailable { .. })
        ));
        assert!(matches!(
            check_reparent(&table, b.id, uuid::Uuid::new_v4(), false),
            Some(ReparentRejection::TargetUnavailable { .. })
        ));
    }

    #[test]
    fn test_rejects_moving_main_group() {
        let (table, root, a, _, _, _) = tree();
        assert_eq!(
            check_reparent(&table, root.id, a.id, false),
            Some(ReparentRejection::MainGroupImmutable { id: root.id })
        );
    }

    #[test]
    fn test_cascading_from_main_group() {
        let (table, root, a, _, _, _) = tree();
        let rejection = check_reparent(&table, root.id, a.id, true).unwrap();
        assert_eq!(rejection, ReparentRejection::MainGroupChildren { id: root.id });
        assert!(rejection.to_string().starts_with("Cannot relink subgroups"));
    }

    #[test]
    fn test_cascading_rejects_main_target() {
        let (table, root, a, _, _, _) = tree();
        assert_eq!(
            check_reparent(&table, a.id, root.id, true),
            Some(ReparentRejection::RelinkIntoMain { target: root.id })
        );
        // Same move is fine when not cascading
        assert_eq!(check_reparent(&table, a.id, root.id, false), None);
    }

    #[test]
    fn test_cascading_without_main_group() {
        let root = Group::new_main("Root");
        let mut a = Group::new_child("A", &root);
        a.parent_id = None;
        let b = Group::new_child("B", &a);
        let table = GroupTable::from_groups(vec![a.clone(), b.clone()]);

        assert_eq!(
            check_reparent(&table, b.id, a.id, true),
            Some(ReparentRejection::MainGroupMissing)
        );
    }

    #[test]
    fn test_cascading_wording() {
        let (table, _, a, b, _, _) = tree();
        let relink = check_reparent(&table, a.id, b.id, true).unwrap();
        let reparent = check_reparent(&table, a.id, b.id, false).unwrap();
        assert!(relink.to_string().starts_with("Cannot relink subgroups"));
        assert!(reparent.to_string().starts_with("Cannot change parent group"));
    }
}
