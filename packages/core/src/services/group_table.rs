//! Id-indexed group table
//!
//! Ordered rows plus an `id → position` map. Both the cache's current-state
//! list and its pending-write queue are `GroupTable`s, which gives the queue
//! its "one latest version per id" coalescing for free.

use crate::models::{Group, GroupId};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    rows: Vec<Group>,
    index: HashMap<GroupId, usize>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows in their given order.
    ///
    /// A repeated id keeps its first position and its last value.
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut table = Self::with_capacity(groups.len());
        for group in groups {
            table.upsert(group);
        }
        table
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &GroupId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &GroupId) -> Option<&Group> {
        self.index.get(id).map(|&pos| &self.rows[pos])
    }

    pub fn get_mut(&mut self, id: &GroupId) -> Option<&mut Group> {
        match self.index.get(id) {
            Some(&pos) => Some(&mut self.rows[pos]),
            None => None,
        }
    }

    /// Replace the row with the same id, or append. Returns true on replace.
    pub fn upsert(&mut self, group: Group) -> bool {
        match self.index.get(&group.id) {
            Some(&pos) => {
                self.rows[pos] = group;
                true
            }
            None => {
                self.index.insert(group.id, self.rows.len());
                self.rows.push(group);
                false
            }
        }
    }

    /// Remove a row by id, keeping the order of the rest
    pub fn remove(&mut self, id: &GroupId) -> Option<Group> {
        let pos = self.index.remove(id)?;
        let removed = self.rows.remove(pos);
        for row in &self.rows[pos..] {
            if let Some(slot) = self.index.get_mut(&row.id) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Keep only rows matching `keep`; returns how many were dropped.
    ///
    /// The surviving rows are collected into a fresh sequence rather than
    /// removed in place.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&Group) -> bool,
    {
        let before = self.rows.len();
        let kept: Vec<Group> = std::mem::take(&mut self.rows)
            .into_iter()
            .filter(|g| keep(g))
            .collect();
        *self = Self::from_groups(kept);
        before - self.rows.len()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.rows.iter()
    }

    pub fn to_vec(&self) -> Vec<Group> {
        self.rows.clone()
    }
}

impl<'a> IntoIterator for &'a GroupTable {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Group, Group, Group, Group) {
        let root = Group::new_main("Root");
        let a = Group::new_child("A", &root);
        let b = Group::new_child("B", &root);
        let c = Group::new_child("C", &root);
        (root, a, b, c)
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let (root, a, _, _) = sample();
        let mut table = GroupTable::new();

        assert!(!table.upsert(root.clone()));
        assert!(!table.upsert(a.clone()));

        let mut renamed = a.clone();
        renamed.name = "A2".to_string();
        assert!(table.upsert(renamed.clone()));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&a.id), Some(&renamed));
    }

    #[test]
    fn test_remove_reindexes_following_rows() {
        let (root, a, b, c) = sample();
        let mut table = GroupTable::from_groups(vec![root.clone(), a.clone(), b.clone(), c.clone()]);

        assert_eq!(table.remove(&a.id).map(|g| g.id), Some(a.id));
        assert!(table.remove(&a.id).is_none());

        assert_eq!(table.get(&b.id).map(|g| g.id), Some(b.id));
        assert_eq!(table.get(&c.id).map(|g| g.id), Some(c.id));
        let ids: Vec<_> = table.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![root.id, b.id, c.id]);
    }

    #[test]
    fn test_retain_drops_adjacent_matches() {
        let (root, a, b, c) = sample();
        let mut table = GroupTable::from_groups(vec![a, b, root.clone(), c]);

        let removed = table.retain(|g| g.main);
        assert_eq!(removed, 3);
        assert_eq!(table.to_vec(), vec![root.clone()]);
        assert_eq!(table.get(&root.id).map(|g| g.id), Some(root.id));
    }

    #[test]
    fn test_from_groups_keeps_last_value_first_position() {
        let (root, a, _, _) = sample();
        let mut newer = a.clone();
        newer.depth_level = 5;

        let table = GroupTable::from_groups(vec![a.clone(), root.clone(), newer.clone()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.to_vec(), vec![newer, root]);
    }
}
