//! Tree Cache - In-memory mirror of the group hierarchy
//!
//! This module provides the authoritative working copy of the group tree:
//!
//! - Current-state list of every group, loaded once at startup
//! - Pending-write queue holding the latest unflushed version per id
//! - Mutations (upsert, reparent, relink, delete, reset) that keep both
//!   collections coherent
//! - Flushing of pending writes to the `GroupStore`
//! - Ancestor/descendant queries for the rest of the system
//!
//! # Locking
//!
//! One `RwLock` covers both collections. Mutations hold the write guard for
//! their whole duration, including store I/O, so each one is atomic with
//! respect to every other cache access. Reads take the read guard. Guards
//! are released on every exit path when they go out of scope.
//!
//! Store calls are bounded by `TreeCacheConfig::store_timeout`, so a stalled
//! backend cannot hold the lock indefinitely.
//!
//! # Write Failures
//!
//! When a flush fails the pending queue is dropped and the cache is reloaded
//! from the store. Failed writes are not retried: after a failure the cache
//! matches what the store actually holds.
//!
//! # Examples
//!
//! ```rust
//! use grouptree_core::db::InMemoryGroupStore;
//! use grouptree_core::models::Group;
//! use grouptree_core::services::TreeCache;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Group::new_main("Company");
//! let store = Arc::new(InMemoryGroupStore::with_groups(vec![root.clone()]));
//! let cache = TreeCache::load(store).await?;
//!
//! let branch = Group::new_child("Branch", &root);
//! cache.upsert(branch.clone()).await?;
//! cache.flush(true).await?;
//!
//! assert_eq!(cache.by_id(branch.id).await, Some(branch));
//! # Ok(())
//! # }
//! ```

use crate::config::TreeCacheConfig;
use crate::db::{GroupEvent, GroupPredicate, GroupStore, StoreError};
use crate::models::{Group, GroupId, OfficeRef, TreeEntry};
use crate::services::consistency::check_reparent;
use crate::services::depth;
use crate::services::error::{ReparentRejection, TreeCacheError};
use crate::services::group_table::GroupTable;
use crate::services::traversal;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Run a store call under a deadline, attaching the operation name to failures
async fn with_deadline<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(|e| StoreError::operation(operation, e)),
        Err(_) => Err(StoreError::timeout(operation, timeout)),
    }
}

/// Everything guarded by the cache lock
struct CacheState {
    groups: GroupTable,
    pending: GroupTable,
    last_reload: DateTime<Utc>,
}

impl CacheState {
    /// Record a new version of `group` in both the list and the queue
    fn stage(&mut self, group: Group) {
        self.groups.upsert(group.clone());
        self.pending.upsert(group);
    }

    /// Move `node_id` under `parent_id` and fix depths below it.
    ///
    /// The move must already have passed `check_reparent`.
    fn relink(&mut self, node_id: GroupId, parent_id: GroupId) -> Option<Group> {
        let parent_depth = self.groups.get(&parent_id)?.depth_level;
        let mut node = self.groups.get(&node_id)?.clone();
        node.parent_id = Some(parent_id);
        node.depth_level = parent_depth + 1;
        node.touch();
        self.stage(node.clone());
        depth::recalc_from(&mut self.groups, &mut self.pending, node_id);
        Some(node)
    }

    /// Check that `group` may be committed at the position it states.
    ///
    /// A new group, or an existing one whose parent changed, must pass the
    /// consistency guard. Every non-root group must sit one level below its
    /// parent.
    fn check_placement(&self, group: &Group) -> Result<(), TreeCacheError> {
        let Some(parent_id) = group.parent_id else {
            return Ok(());
        };

        let parent_changed = self
            .groups
            .get(&group.id)
            .map_or(true, |existing| existing.parent_id != Some(parent_id));
        if parent_changed {
            if let Some(rejection) = check_reparent(&self.groups, group.id, parent_id, false) {
                return Err(rejection.into());
            }
        }

        let parent = self
            .groups
            .get(&parent_id)
            .ok_or(ReparentRejection::TargetUnavailable {
                target: parent_id,
                cascading: false,
            })?;
        let expected = parent.depth_level + 1;
        if group.depth_level != expected {
            return Err(TreeCacheError::DepthMismatch {
                id: group.id,
                expected,
                actual: group.depth_level,
            });
        }
        Ok(())
    }
}

/// Statistics about the tree cache
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Groups in the current-state list
    pub groups: usize,
    /// Groups waiting to be flushed
    pub pending: usize,
    /// When the list was last replaced from the store
    pub last_reload: DateTime<Utc>,
}

/// Shared in-memory group tree backed by a `GroupStore`.
///
/// Construct once per process with [`TreeCache::load`] and share it behind an
/// `Arc`.
pub struct TreeCache {
    state: RwLock<CacheState>,
    store: Arc<dyn GroupStore>,
    config: TreeCacheConfig,
    event_tx: broadcast::Sender<GroupEvent>,
}

impl TreeCache {
    /// Load the full tree from `store` with default configuration.
    ///
    /// # Errors
    ///
    /// `StartupLoad` if the store cannot be read. The process should not
    /// continue without a tree.
    pub async fn load(store: Arc<dyn GroupStore>) -> Result<Self, TreeCacheError> {
        Self::load_with_config(store, TreeCacheConfig::default()).await
    }

    /// Load the full tree from `store`
    pub async fn load_with_config(
        store: Arc<dyn GroupStore>,
        config: TreeCacheConfig,
    ) -> Result<Self, TreeCacheError> {
        config.validate().map_err(TreeCacheError::InvalidConfig)?;

        let groups = with_deadline(
            "load_all_ordered_by_depth",
            config.store_timeout,
            store.load_all_ordered_by_depth(),
        )
        .await
        .map_err(TreeCacheError::StartupLoad)?;

        tracing::info!("Loaded {} group(s) into tree cache", groups.len());

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            state: RwLock::new(CacheState {
                groups: GroupTable::from_groups(groups),
                pending: GroupTable::new(),
                last_reload: Utc::now(),
            }),
            store,
            config,
            event_tx,
        })
    }

    pub fn config(&self) -> &TreeCacheConfig {
        &self.config
    }

    /// Subscribe to domain events
    pub fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores errors if no subscribers
    fn emit_event(&self, event: GroupEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn read_all(&self) -> Result<Vec<Group>, StoreError> {
        with_deadline(
            "load_all_ordered_by_depth",
            self.config.store_timeout,
            self.store.load_all_ordered_by_depth(),
        )
        .await
    }

    //
    // LIFECYCLE
    //

    /// Compact the store and replace the cache with a full re-read.
    ///
    /// Unflushed pending writes are re-applied on top of the fresh list so they
    /// are neither lost nor hidden from readers. A group deleted from the store
    /// by another writer therefore reappears if it still has a pending version,
    /// and is written back by the next flush. On a read failure the cache is
    /// left as it was.
    pub async fn reload(&self) -> Result<usize, TreeCacheError> {
        let mut state = self.state.write().await;

        if self.config.compact_on_reload {
            if let Err(e) =
                with_deadline("compact", self.config.store_timeout, self.store.compact()).await
            {
                tracing::warn!("Compaction before reload failed, reading anyway: {}", e);
            }
        }

        let loaded = self.read_all().await?;
        let mut groups = GroupTable::from_groups(loaded);
        for group in state.pending.iter() {
            groups.upsert(group.clone());
        }

        let count = groups.len();
        state.groups = groups;
        state.last_reload = Utc::now();
        drop(state);

        tracing::info!("Reloaded tree cache with {} group(s)", count);
        self.emit_event(GroupEvent::Reloaded { count });
        Ok(count)
    }

    //
    // MUTATIONS
    //

    /// Insert or replace a group in the cache and queue it for writing.
    ///
    /// The group's own shape is validated, and a second main group or a second
    /// office group for the same office is refused. A new parent must pass the
    /// consistency guard and `depth_level` must be the parent's depth plus one.
    /// When an existing group's depth changes, depths below it are recomputed
    /// and queued as well.
    pub async fn upsert(&self, group: Group) -> Result<(), TreeCacheError> {
        group.validate()?;

        let mut state = self.state.write().await;

        if let Some(existing) = state.groups.get(&group.id) {
            if existing.main && !group.main {
                return Err(ReparentRejection::MainGroupImmutable { id: group.id }.into());
            }
        }

        if group.main {
            if let Some(existing) = state.groups.iter().find(|g| g.main && g.id != group.id) {
                return Err(TreeCacheError::DuplicateMainGroup {
                    existing: existing.id,
                    rejected: group.id,
                });
            }
        }

        if let (true, Some(office_id)) = (group.office_group, group.office_id) {
            if let Some(existing) = state
                .groups
                .iter()
                .find(|g| g.office_group && g.office_id == Some(office_id) && g.id != group.id)
            {
                return Err(TreeCacheError::DuplicateOfficeGroup {
                    office_id,
                    existing: existing.id,
                    rejected: group.id,
                });
            }
        }

        if let Err(e) = state.check_placement(&group) {
            tracing::debug!("Upsert of {} rejected: {}", group.id, e);
            return Err(e);
        }

        let previous_depth = state.groups.get(&group.id).map(|g| g.depth_level);
        state.stage(group.clone());
        if previous_depth.is_some_and(|d| d != group.depth_level) {
            let state = &mut *state;
            depth::recalc_from(&mut state.groups, &mut state.pending, group.id);
        }
        drop(state);

        self.emit_event(GroupEvent::Upserted(group));
        Ok(())
    }

    /// Write all pending groups to the store.
    ///
    /// An empty queue returns `Ok(0)` without touching the store. On success
    /// the store is optionally compacted and the queue cleared. On failure the
    /// queue is discarded and the cache reloaded from the store.
    pub async fn flush(&self, compact: bool) -> Result<usize, TreeCacheError> {
        let mut state = self.state.write().await;

        if state.pending.is_empty() {
            tracing::debug!("Flush skipped: no pending group writes");
            return Ok(0);
        }

        let batch = state.pending.to_vec();
        let count = batch.len();

        if let Err(source) = with_deadline(
            "bulk_append",
            self.config.store_timeout,
            self.store.bulk_append(batch),
        )
        .await
        {
            tracing::warn!(
                "Flush of {} group(s) failed, discarding pending writes and reloading: {}",
                count,
                source
            );
            state.pending.clear();

            let reconciled = match self.read_all().await {
                Ok(groups) => {
                    state.groups = GroupTable::from_groups(groups);
                    state.last_reload = Utc::now();
                    true
                }
                Err(e) => {
                    tracing::error!("Reload after failed flush also failed: {}", e);
                    false
                }
            };
            drop(state);

            if reconciled {
                self.emit_event(GroupEvent::Reconciled { discarded: count });
            }
            return Err(TreeCacheError::FlushFailed {
                source,
                discarded: count,
                reconciled,
            });
        }

        let mut compacted = false;
        if compact {
            match with_deadline("compact", self.config.store_timeout, self.store.compact()).await {
                Ok(()) => compacted = true,
                Err(e) => tracing::warn!("Compaction after flush failed: {}", e),
            }
        }

        state.pending.clear();
        drop(state);

        tracing::debug!("Flushed {} group(s) (compacted: {})", count, compacted);
        self.emit_event(GroupEvent::Flushed { count, compacted });
        Ok(count)
    }

    /// Delete a group from the store and the cache.
    ///
    /// Children are not touched; relink them first with
    /// [`TreeCache::relink_children`]. The main group cannot be deleted.
    pub async fn delete_by_id(&self, id: GroupId) -> Result<(), TreeCacheError> {
        let mut state = self.state.write().await;

        match state.groups.get(&id) {
            None => return Err(TreeCacheError::group_not_found(id)),
            Some(group) if group.main => {
                return Err(ReparentRejection::MainGroupImmutable { id }.into())
            }
            Some(_) => {}
        }

        with_deadline(
            "delete_where",
            self.config.store_timeout,
            self.store.delete_where(GroupPredicate::Id(id)),
        )
        .await?;

        state.groups.remove(&id);
        state.pending.remove(&id);
        drop(state);

        tracing::info!("Deleted group {}", id);
        self.emit_event(GroupEvent::Deleted { id });
        Ok(())
    }

    /// Delete every non-main group from the store and the cache.
    ///
    /// Returns how many groups were removed from the cache.
    pub async fn reset_non_main(&self) -> Result<usize, TreeCacheError> {
        let mut state = self.state.write().await;

        with_deadline(
            "delete_where",
            self.config.store_timeout,
            self.store.delete_where(GroupPredicate::NonMain),
        )
        .await?;

        let removed = state.groups.retain(|g| g.main);
        state.pending.retain(|g| g.main);
        drop(state);

        tracing::info!("Reset group tree, removed {} non-main group(s)", removed);
        self.emit_event(GroupEvent::Reset { removed });
        Ok(removed)
    }

    /// Move a group under a new parent.
    ///
    /// Runs the consistency guard first; a rejection leaves cache and queue
    /// untouched. On success the group and every descendant whose depth
    /// changed are queued for writing.
    pub async fn reparent(
        &self,
        id: GroupId,
        new_parent_id: GroupId,
    ) -> Result<Group, TreeCacheError> {
        let mut state = self.state.write().await;

        if !state.groups.contains(&id) {
            return Err(TreeCacheError::group_not_found(id));
        }

        if let Some(rejection) = check_reparent(&state.groups, id, new_parent_id, false) {
            tracing::debug!("Reparent of {} rejected: {}", id, rejection);
            return Err(rejection.into());
        }

        let moved = state
            .relink(id, new_parent_id)
            .ok_or_else(|| TreeCacheError::group_not_found(new_parent_id))?;
        drop(state);

        self.emit_event(GroupEvent::Upserted(moved.clone()));
        Ok(moved)
    }

    /// Move every direct child of `from_id` under `to_id`.
    ///
    /// Used before deleting or deactivating `from_id`, so `from_id` may not be
    /// the main group. The target may not be the main group, `from_id` itself,
    /// or anything below `from_id`.
    /// Returns the ids of the moved children.
    pub async fn relink_children(
        &self,
        from_id: GroupId,
        to_id: GroupId,
    ) -> Result<Vec<GroupId>, TreeCacheError> {
        let mut state = self.state.write().await;

        if !state.groups.contains(&from_id) {
            return Err(TreeCacheError::group_not_found(from_id));
        }

        if let Some(rejection) = check_reparent(&state.groups, from_id, to_id, true) {
            tracing::debug!("Relink of children of {} rejected: {}", from_id, rejection);
            return Err(rejection.into());
        }

        let child_ids: Vec<GroupId> = traversal::children_of(&state.groups, from_id)
            .map(|g| g.id)
            .collect();

        let mut moved = Vec::with_capacity(child_ids.len());
        for child_id in &child_ids {
            if let Some(child) = state.relink(*child_id, to_id) {
                moved.push(child);
            }
        }
        drop(state);

        tracing::info!(
            "Relinked {} subgroup(s) from {} to {}",
            moved.len(),
            from_id,
            to_id
        );
        for group in moved {
            self.emit_event(GroupEvent::Upserted(group));
        }
        Ok(child_ids)
    }

    /// Mark a group inactive so it can no longer receive children
    pub async fn deactivate(&self, id: GroupId) -> Result<Group, TreeCacheError> {
        let mut state = self.state.write().await;

        let mut group = state
            .groups
            .get(&id)
            .cloned()
            .ok_or_else(|| TreeCacheError::group_not_found(id))?;
        if group.main {
            return Err(ReparentRejection::MainGroupImmutable { id }.into());
        }

        group.active = false;
        group.touch();
        state.stage(group.clone());
        drop(state);

        self.emit_event(GroupEvent::Upserted(group.clone()));
        Ok(group)
    }

    /// Recompute depths below `root_id` from its current depth.
    ///
    /// Only call this after a structural change that passed
    /// [`TreeCache::check_reparent`]; the walk has no cycle detection.
    pub async fn recalc_from(&self, root_id: GroupId) -> Result<usize, TreeCacheError> {
        let mut state = self.state.write().await;
        if !state.groups.contains(&root_id) {
            return Err(TreeCacheError::group_not_found(root_id));
        }

        let state = &mut *state;
        Ok(depth::recalc_from(
            &mut state.groups,
            &mut state.pending,
            root_id,
        ))
    }

    //
    // QUERIES
    //

    /// Check whether `node_id` may move under `target_id`; `None` means allowed
    pub async fn check_reparent(
        &self,
        node_id: GroupId,
        target_id: GroupId,
        cascading: bool,
    ) -> Option<ReparentRejection> {
        let state = self.state.read().await;
        check_reparent(&state.groups, node_id, target_id, cascading)
    }

    pub async fn by_id(&self, id: GroupId) -> Option<Group> {
        let state = self.state.read().await;
        traversal::by_id(&state.groups, id)
    }

    pub async fn by_parent_id(&self, parent_id: GroupId) -> Vec<Group> {
        let state = self.state.read().await;
        traversal::by_parent_id(&state.groups, parent_id)
    }

    pub async fn main_group_id(&self) -> Result<GroupId, TreeCacheError> {
        let state = self.state.read().await;
        traversal::main_group_id(&state.groups)
    }

    pub async fn office_group_id(&self, office: &OfficeRef) -> Result<GroupId, TreeCacheError> {
        let state = self.state.read().await;
        traversal::office_group_id(&state.groups, office)
    }

    /// Breadcrumb from the main group down to `group_id`, followed by `leaf`
    pub async fn ancestor_path(&self, group_id: GroupId, leaf: TreeEntry) -> Vec<TreeEntry> {
        let state = self.state.read().await;
        traversal::ancestor_path(&state.groups, group_id, leaf)
    }

    pub async fn descendant_set(&self, group_id: GroupId) -> Vec<GroupId> {
        let state = self.state.read().await;
        traversal::descendant_set(&state.groups, group_id)
    }

    /// Copy of the current-state list
    pub async fn snapshot(&self) -> Vec<Group> {
        self.state.read().await.groups.to_vec()
    }

    /// Copy of the pending-write queue
    pub async fn pending(&self) -> Vec<Group> {
        self.state.read().await.pending.to_vec()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.groups.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.groups.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        CacheStats {
            groups: state.groups.len(),
            pending: state.pending.len(),
            last_reload: state.last_reload,
        }
    }
}

#[cfg(test)]
#[path = "tree_cache_test.rs"]
mod tree_cache_test;
