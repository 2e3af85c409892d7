//! Tests for the Group model
//!
//! Covers constructors, shape validation, and the camelCase wire format the
//! HTTP layer relies on.

#[cfg(test)]
mod tests {
    use crate::models::{Group, GroupValidationError, OfficeRef, TreeEntry};
    use serde_json::json;
    use uuid::Uuid;

    // ========================================================================
    // Constructors
    // ========================================================================

    #[test]
    fn test_new_main_is_root_at_depth_zero() {
        let root = Group::new_main("Company");
        assert!(root.main);
        assert!(root.active);
        assert!(root.is_root());
        assert_eq!(root.depth_level, 0);
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_new_child_links_to_parent() {
        let root = Group::new_main("Company");
        let child = Group::new_child("Branch", &root);
        let grandchild = Group::new_child("Floor", &child);

        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(grandchild.depth_level, 2);
        assert!(!child.main);
        assert!(grandchild.validate().is_ok());
    }

    #[test]
    fn test_with_office_sets_flag_and_reference() {
        let root = Group::new_main("Company");
        let office = OfficeRef::new(Uuid::new_v4(), "Berlin");
        let group = Group::new_child("Berlin office", &root).with_office(&office);

        assert!(group.office_group);
        assert_eq!(group.office_id, Some(office.id));
    }

    // ========================================================================
    // validate()
    // ========================================================================

    #[test]
    fn test_validate_rejects_empty_name() {
        let root = Group::new_main("   ");
        assert_eq!(
            root.validate(),
            Err(GroupValidationError::EmptyName { id: root.id })
        );
    }

    #[test]
    fn test_validate_rejects_main_with_parent() {
        let mut root = Group::new_main("Company");
        root.parent_id = Some(Uuid::new_v4());
        assert!(matches!(
            root.validate(),
            Err(GroupValidationError::MainWithParent { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_orphan_non_main() {
        let root = Group::new_main("Company");
        let mut child = Group::new_child("Branch", &root);
        child.parent_id = None;
        assert!(matches!(
            child.validate(),
            Err(GroupValidationError::MissingParent { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_self_parent() {
        let root = Group::new_main("Company");
        let mut child = Group::new_child("Branch", &root);
        child.parent_id = Some(child.id);
        assert!(matches!(
            child.validate(),
            Err(GroupValidationError::SelfParent { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_depth() {
        let mut root = Group::new_main("Company");
        root.depth_level = -1;
        assert!(matches!(
            root.validate(),
            Err(GroupValidationError::NegativeDepth { depth: -1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_office_group_without_office() {
        let root = Group::new_main("Company");
        let mut group = Group::new_child("Office", &root);
        group.office_group = true;
        assert!(matches!(
            group.validate(),
            Err(GroupValidationError::OfficeGroupWithoutOffice { .. })
        ));
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    #[test]
    fn test_group_serializes_camel_case() {
        let root = Group::new_main("Company");
        let office = OfficeRef::new(Uuid::new_v4(), "Berlin");
        let group = Group::new_child("Berlin", &root).with_office(&office);

        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["parentId"], json!(root.id));
        assert_eq!(value["depthLevel"], 1);
        assert_eq!(value["officeGroup"], true);
        assert_eq!(value["office"], json!(office.id));
        assert!(value.get("modifiedAt").is_some());
    }

    #[test]
    fn test_group_deserialization_defaults() {
        let id = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let value = json!({
            "id": id,
            "name": "Lab",
            "parentId": parent,
            "depthLevel": 3,
            "modifiedAt": "2025-01-03T10:00:00Z"
        });

        let group: Group = serde_json::from_value(value).unwrap();
        assert_eq!(group.id, id);
        assert!(group.active, "active defaults to true");
        assert!(!group.main);
        assert!(!group.office_group);
        assert!(group.office_id.is_none());
    }

    #[test]
    fn test_device_tree_entry_label() {
        let id = Uuid::new_v4();
        let entry = TreeEntry::device(id, "Sensor 7", "10.0.0.7");
        assert_eq!(entry.id, id);
        assert_eq!(entry.name, "Sensor 7 (10.0.0.7)");
    }
}
