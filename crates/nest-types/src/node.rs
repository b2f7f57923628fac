//! Materialized snapshot nodes.
//!
//! A [`Node`] is an immutable point-in-time copy of one bucket or key. It
//! carries no handle back into the store; once built it is never mutated.
//! Children are reference-counted so the tree and the
//! [`PathIndex`](crate::PathIndex) share the same nodes.

use std::sync::Arc;

use crate::path::Path;

/// What a node holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A nested namespace. Children are in the store's byte order.
    Bucket { children: Vec<Arc<Node>> },
    /// A leaf value.
    Key { value: Vec<u8> },
}

/// One entry of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    path: Path,
    kind: NodeKind,
}

impl Node {
    /// A bucket node with the given children.
    pub fn bucket(path: Path, children: Vec<Node>) -> Self {
        Self {
            path,
            kind: NodeKind::Bucket {
                children: children.into_iter().map(Arc::new).collect(),
            },
        }
    }

    /// A key node holding `value`.
    pub fn key(path: Path, value: Vec<u8>) -> Self {
        Self {
            path,
            kind: NodeKind::Key { value },
        }
    }

    pub fn name(&self) -> &[u8] {
        self.path.name()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self.kind, NodeKind::Bucket { .. })
    }

    /// The leaf value, or `None` for a bucket.
    pub fn value(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::Key { value } => Some(value),
            NodeKind::Bucket { .. } => None,
        }
    }

    /// Direct children. Always empty for a key.
    pub fn children(&self) -> &[Arc<Node>] {
        match &self.kind {
            NodeKind::Bucket { children } => children,
            NodeKind::Key { .. } => &[],
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &[u8]) -> Option<&Arc<Node>> {
        self.children().iter().find(|c| c.name() == name)
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Compare contents while ignoring where the two subtrees live.
    ///
    /// Keys match on value; buckets match when their children match
    /// pairwise by name and contents. The names of `self` and `other`
    /// themselves are not compared.
    pub fn same_contents(&self, other: &Node) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Key { value: a }, NodeKind::Key { value: b }) => a == b,
            (NodeKind::Bucket { children: a }, NodeKind::Bucket { children: b }) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| x.name() == y.name() && x.same_contents(y))
            }
            _ => false,
        }
    }
}

/// Iterator returned by [`Node::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev().map(|c| &**c));
        Some(node)
    }
}
