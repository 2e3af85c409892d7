//! In-memory GroupStore backend
//!
//! An append-only row log with the same read/compaction semantics as a
//! replacing merge table: reads see the latest row per id, `compact`
//! physically drops superseded rows. Used by tests, benchmarks, and
//! single-process deployments that do not need durability.

use crate::db::group_store::{GroupPredicate, GroupStore};
use crate::models::{Group, GroupId};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
pub struct InMemoryGroupStore {
    rows: Arc<Mutex<Vec<Group>>>,
    fail_next_append: AtomicBool,
    fail_loads: AtomicBool,
    compactions: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose log already contains `groups`
    pub fn with_groups(groups: Vec<Group>) -> Self {
        let store = Self::new();
        if let Ok(mut rows) = store.rows.lock() {
            *rows = groups;
        }
        store
    }

    /// Make the next `bulk_append` fail without writing anything
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// Make every load fail until switched off again
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Delay every call, simulating a slow backend
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.delay.lock() {
            *slot = delay;
        }
    }

    /// Number of physical rows in the log, including superseded versions
    pub fn row_count(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    /// How many times `compact` has run
    pub fn compaction_count(&self) -> usize {
        self.compactions.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = self.delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            sleep(delay).await;
        }
    }

    fn lock_rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<Group>>> {
        self.rows
            .lock()
            .map_err(|_| anyhow!("group log lock poisoned"))
    }
}

/// Keep the last row for every id, preserving first-seen order
fn latest_rows(rows: &[Group]) -> Vec<Group> {
    let mut positions: HashMap<GroupId, usize> = HashMap::new();
    let mut latest: Vec<Group> = Vec::new();
    for row in rows {
        match positions.get(&row.id) {
            Some(&pos) => latest[pos] = row.clone(),
            None => {
                positions.insert(row.id, latest.len());
                latest.push(row.clone());
            }
        }
    }
    latest
}

#[async_trait]
impl GroupStore for InMemoryGroupStore {
    async fn load_all_ordered_by_depth(&self) -> Result<Vec<Group>> {
        self.simulate_latency().await;

        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(anyhow!("group log unavailable"));
        }

        let rows = self.lock_rows()?;
        let mut groups = latest_rows(&rows);
        // Stable: siblings keep insertion order
        groups.sort_by_key(|g| g.depth_level);
        Ok(groups)
    }

    async fn bulk_append(&self, groups: Vec<Group>) -> Result<()> {
        self.simulate_latency().await;

        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("bulk append rejected by backend"));
        }

        self.lock_rows()?.extend(groups);
        Ok(())
    }

    async fn delete_where(&self, predicate: GroupPredicate) -> Result<usize> {
        self.simulate_latency().await;

        let mut rows = self.lock_rows()?;
        let before = rows.len();
        rows.retain(|row| !predicate.matches(row));
        Ok(before - rows.len())
    }

    async fn compact(&self) -> Result<()> {
        self.simulate_latency().await;

        let mut rows = self.lock_rows()?;
        *rows = latest_rows(&rows);
        self.compactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
