//! Flat lookup from path string to snapshot node.
//!
//! A [`PathIndex`] is built once from a forest of root nodes and covers every
//! node at every depth. It has no insert operation: an index from one
//! snapshot generation is never combined with nodes from another.

use std::collections::HashMap;
use std::sync::Arc;

use crate::node::Node;
use crate::path::Path;

/// Mapping from `/`-joined path strings to nodes of a single snapshot.
#[derive(Clone, Debug, Default)]
pub struct PathIndex {
    entries: HashMap<String, Arc<Node>>,
}

impl PathIndex {
    /// Index every node reachable from `roots`.
    pub fn build(roots: &[Arc<Node>]) -> Self {
        let mut entries = HashMap::new();
        let mut stack: Vec<&Arc<Node>> = roots.iter().collect();
        while let Some(node) = stack.pop() {
            entries.insert(node.path().to_key_string(), Arc::clone(node));
            stack.extend(node.children());
        }
        Self { entries }
    }

    /// Look up a node by its string path, e.g. `"a/b/k"`.
    pub fn get(&self, key: &str) -> Option<&Arc<Node>> {
        self.entries.get(key)
    }

    /// Look up a node by [`Path`].
    pub fn get_path(&self, path: &Path) -> Option<&Arc<Node>> {
        self.get(&path.to_key_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of indexed nodes (buckets and keys).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All indexed path strings, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
