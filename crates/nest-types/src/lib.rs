//! Foundation types for nest.
//!
//! This crate provides the addressing and snapshot types shared by the store
//! and every front end. It has no knowledge of the storage engine.
//!
//! # Key Types
//!
//! - [`Path`] -- Non-empty sequence of byte segments addressing a bucket or key
//! - [`Node`] / [`NodeKind`] -- Immutable materialized bucket or key
//! - [`PathIndex`] -- Flat map from path string to node for one snapshot
//! - [`Snapshot`] -- Forest of top-level buckets plus its index
//! - [`PathError`] -- Path and name validation failures

pub mod error;
pub mod index;
pub mod names;
pub mod node;
pub mod path;
pub mod snapshot;

pub use error::PathError;
pub use index::PathIndex;
pub use names::validate_name;
pub use node::{Node, NodeKind, Walk};
pub use path::{Path, SEPARATOR};
pub use snapshot::Snapshot;
