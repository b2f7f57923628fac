//! Operations on snapshot nodes whose kind picks the bucket or key variant.

use nest_types::{Node, NodeKind, Path};

use crate::error::StoreResult;
use crate::handle::Store;

impl Store {
    pub fn delete_item(&mut self, node: &Node) -> StoreResult<()> {
        match node.kind() {
            NodeKind::Bucket { .. } => self.delete_bucket(node.path()),
            NodeKind::Key { .. } => self.delete_key(node.path()),
        }
    }

    pub fn rename_item(&mut self, node: &Node, new_name: &[u8]) -> StoreResult<()> {
        match node.kind() {
            NodeKind::Bucket { .. } => self.rename_bucket(node.path(), new_name),
            NodeKind::Key { .. } => self.rename_key(node.path(), new_name),
        }
    }

    pub fn copy_item(&mut self, node: &Node, dst: &Path) -> StoreResult<()> {
        match node.kind() {
            NodeKind::Bucket { .. } => self.copy_bucket(node.path(), dst),
            NodeKind::Key { .. } => self.copy_key(node.path(), dst),
        }
    }

    pub fn move_item(&mut self, node: &Node, dst: &Path) -> StoreResult<()> {
        match node.kind() {
            NodeKind::Bucket { .. } => self.move_bucket(node.path(), dst),
            NodeKind::Key { .. } => self.move_key(node.path(), dst),
        }
    }
}
