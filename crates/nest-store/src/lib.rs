//! Nested bucket and key namespace over an embedded transactional store.
//!
//! A store file holds a tree of buckets (namespaces) and keys (byte values),
//! addressed by slash-joined [`Path`](nest_types::Path)s. This crate opens
//! that file exclusively, mutates the tree, and materializes it into
//! [`Snapshot`](nest_types::Snapshot)s for display.
//!
//! # Key Types
//!
//! - [`Store`] -- exclusive handle to one store file
//! - [`Session`] -- a store plus its current snapshot
//! - [`StoreConfig`] -- open timeout and durability settings
//! - [`StoreError`] / [`ErrorKind`] -- failures and their coarse classes
//!
//! # Operations
//!
//! Buckets: [`Store::create_bucket`], [`Store::delete_bucket`],
//! [`Store::empty_bucket`], [`Store::rename_bucket`], [`Store::copy_bucket`],
//! [`Store::move_bucket`].
//!
//! Keys: [`Store::create_key`], [`Store::rename_key`], [`Store::delete_key`],
//! [`Store::copy_key`], [`Store::move_key`], [`Store::update_key`],
//! [`Store::get_key`].
//!
//! # Design Rules
//!
//! 1. One operation is one write transaction. It commits whole or not at all.
//! 2. Keys live inside buckets. The root namespace holds only buckets.
//! 3. Snapshots are rebuilt from scratch after every mutation, never patched.
//! 4. Only one handle may hold a store file at a time.

pub mod config;
pub mod error;
pub mod resolver;

mod buckets;
mod engine;
mod handle;
mod items;
mod keys;
mod session;
mod snapshot;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{JournalMode, StoreConfig, Synchronous};
pub use engine::Bucket;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use handle::Store;
pub use session::Session;
