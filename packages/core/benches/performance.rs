//! Performance benchmarks for the group tree cache
//!
//! Run with: `cargo bench -p grouptree-core`
//!
//! These benchmarks measure critical path performance:
//! - Upsert into a populated cache
//! - Descendant enumeration (used by every reparent check)
//! - Breadcrumb construction for a deep leaf
//! - Reparent with depth recalculation of a large subtree

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grouptree_core::db::InMemoryGroupStore;
use grouptree_core::models::{Group, TreeEntry};
use grouptree_core::services::TreeCache;
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Build a tree with `fanout` children per group, `levels` deep below the root
fn generate_tree(fanout: usize, levels: usize) -> Vec<Group> {
    let root = Group::new_main("Root");
    let mut all = vec![root.clone()];
    let mut frontier = vec![root];

    for level in 0..levels {
        let mut next = Vec::with_capacity(frontier.len() * fanout);
        for parent in &frontier {
            for i in 0..fanout {
                next.push(Group::new_child(format!("L{}-{}", level, i), parent));
            }
        }
        all.extend(next.iter().cloned());
        frontier = next;
    }

    all
}

async fn setup_cache(groups: Vec<Group>) -> TreeCache {
    let store = Arc::new(InMemoryGroupStore::with_groups(groups));
    TreeCache::load(store).await.unwrap()
}

fn bench_upsert(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let groups = generate_tree(4, 5);
    let root = groups[0].clone();
    let cache = rt.block_on(setup_cache(groups));

    c.bench_function("upsert_into_1365_groups", |b| {
        b.iter(|| {
            rt.block_on(async {
                let group = Group::new_child("bench", &root);
                cache.upsert(black_box(group)).await.unwrap();
            })
        })
    });
}

fn bench_traversal(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let groups = generate_tree(4, 5);
    let root_id = groups[0].id;
    let deepest_id = groups[groups.len() - 1].id;
    let cache = rt.block_on(setup_cache(groups));

    c.bench_function("descendant_set_from_root", |b| {
        b.iter(|| rt.block_on(cache.descendant_set(black_box(root_id))))
    });

    c.bench_function("ancestor_path_deepest_leaf", |b| {
        b.iter(|| {
            rt.block_on(cache.ancestor_path(
                black_box(deepest_id),
                TreeEntry::device(Uuid::nil(), "device", "host"),
            ))
        })
    });
}

fn bench_reparent(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let groups = generate_tree(3, 5);
    let root = groups[0].clone();
    let cache = rt.block_on(setup_cache(groups.clone()));
    let first_child = groups[1].id;
    let second_child = groups[2].id;

    // Alternate between two parents so every move shifts the whole subtree
    let mut flip = false;
    c.bench_function("reparent_subtree_of_121", |b| {
        b.iter(|| {
            let target = if flip { root.id } else { second_child };
            flip = !flip;
            rt.block_on(cache.reparent(first_child, target)).unwrap();
        })
    });
}

criterion_group!(benches, bench_upsert, bench_traversal, bench_reparent);
criterion_main!(benches);
