//! Point-in-time materialization of a whole store.

use std::sync::Arc;

use crate::index::PathIndex;
use crate::node::Node;
use crate::path::Path;

/// A full point-in-time materialization of a store: the forest of top-level
/// buckets plus an index over every node.
///
/// `generation` increases with every snapshot taken from the same store
/// handle. A snapshot is always replaced as a whole, never patched.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    generation: u64,
    roots: Vec<Arc<Node>>,
    index: PathIndex,
}

impl Snapshot {
    /// Wrap a forest and index it.
    pub fn new(generation: u64, roots: Vec<Node>) -> Self {
        let roots: Vec<Arc<Node>> = roots.into_iter().map(Arc::new).collect();
        let index = PathIndex::build(&roots);
        Self {
            generation,
            roots,
            index,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Top-level buckets in byte order of their names.
    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Shorthand for `self.index().get(key)`.
    pub fn get(&self, key: &str) -> Option<&Arc<Node>> {
        self.index.get(key)
    }

    pub fn get_path(&self, path: &Path) -> Option<&Arc<Node>> {
        self.index.get_path(path)
    }

    /// Pre-order walk over every node of every root.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.roots.iter().flat_map(|root| root.walk())
    }

    /// Number of keys across the whole snapshot.
    pub fn key_count(&self) -> usize {
        self.nodes().filter(|n| !n.is_bucket()).count()
    }

    /// Number of buckets across the whole snapshot, top-level included.
    pub fn bucket_count(&self) -> usize {
        self.nodes().filter(|n| n.is_bucket()).count()
    }
}
