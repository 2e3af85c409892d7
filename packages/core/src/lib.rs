//! GroupTree Core
//!
//! This crate manages a hierarchical tree of organizational groups backed by
//! a persistent store, with an in-memory mirror kept current for fast reads.
//!
//! # Architecture
//!
//! - **In-Memory Mirror**: `TreeCache` holds the working copy of every group
//!   and serves ancestor/descendant queries without touching storage
//! - **Batched Writes**: mutations queue the latest version per id; `flush`
//!   appends the queue to the store in one call
//! - **Guarded Structure**: every parent change is validated against cycles,
//!   self-parenting and inactive targets before it is applied
//! - **Storage Wins**: a failed flush drops unconfirmed writes and reloads
//!
//! # Modules
//!
//! - [`models`] - Group entity and breadcrumb types
//! - [`db`] - Persistence gateway trait, in-memory backend, domain events
//! - [`services`] - Tree cache, consistency guard, depth recalculation, traversal
//! - [`config`] - Cache configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::TreeCacheConfig;
pub use models::*;
pub use services::*;
