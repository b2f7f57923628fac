//! Bucket operations.
//!
//! Each public operation runs in exactly one write transaction. Recursive
//! copies happen entirely inside that transaction, so a failure at any depth
//! leaves no partial destination behind.

use rusqlite::Connection;
use tracing::debug;

use nest_types::Path;

use crate::engine::{self, Bucket, Entry};
use crate::error::{StoreError, StoreResult};
use crate::handle::Store;
use crate::resolver;

impl Store {
    /// Create the bucket at `path` along with any missing ancestors.
    ///
    /// Idempotent: an existing bucket is returned as is.
    pub fn create_bucket(&mut self, path: &Path) -> StoreResult<Bucket> {
        let bucket = self.update(|tx| resolver::ensure_path(tx, path))?;
        debug!(path = %path, "bucket created");
        Ok(bucket)
    }

    /// Delete the bucket at `path` and everything beneath it.
    pub fn delete_bucket(&mut self, path: &Path) -> StoreResult<()> {
        self.update(|tx| remove_bucket(tx, path))?;
        debug!(path = %path, "bucket deleted");
        Ok(())
    }

    /// Remove every child of the bucket at `path`, keeping the bucket.
    pub fn empty_bucket(&mut self, path: &Path) -> StoreResult<()> {
        let removed = self.update(|tx| {
            let bucket = resolver::resolve(tx, path)?;
            let children = engine::children(tx, bucket)?;
            for (name, entry) in &children {
                match entry {
                    Entry::Value(_) => engine::delete_value(tx, bucket, name)?,
                    Entry::Bucket(_) => engine::delete_bucket(tx, bucket, name)?,
                };
            }
            Ok(children.len())
        })?;
        debug!(path = %path, removed, "bucket emptied");
        Ok(())
    }

    /// Give the bucket at `path` a new last segment.
    ///
    /// The whole subtree moves, nested buckets included.
    pub fn rename_bucket(&mut self, path: &Path, new_name: &[u8]) -> StoreResult<()> {
        let target = path.sibling(new_name)?;
        self.update(|tx| {
            let parent = resolver::parent_or_root(tx, path)?;
            let source = resolver::resolve(tx, path)?;
            if engine::lookup(tx, parent, new_name)?.is_some() {
                return Err(StoreError::key_exists(&target));
            }
            let renamed = engine::insert_bucket(tx, parent, new_name)?;
            copy_contents(tx, source, renamed)?;
            engine::delete_bucket(tx, parent, path.name())?;
            Ok(())
        })?;
        debug!(from = %path, to = %target, "bucket renamed");
        Ok(())
    }

    /// Deep-copy the bucket at `src` to a new bucket at `dst`.
    ///
    /// Missing ancestors of `dst` are created. `dst` itself must be free.
    pub fn copy_bucket(&mut self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.update(|tx| copy_subtree(tx, src, dst))?;
        debug!(from = %src, to = %dst, "bucket copied");
        Ok(())
    }

    /// [`copy_bucket`](Self::copy_bucket), then delete `src`.
    pub fn move_bucket(&mut self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.update(|tx| {
            copy_subtree(tx, src, dst)?;
            remove_bucket(tx, src)
        })?;
        debug!(from = %src, to = %dst, "bucket moved");
        Ok(())
    }
}

fn remove_bucket(conn: &Connection, path: &Path) -> StoreResult<()> {
    let parent = resolver::parent_or_root(conn, path)?;
    if engine::delete_bucket(conn, parent, path.name())? {
        return Ok(());
    }
    match engine::lookup(conn, parent, path.name())? {
        Some(Entry::Value(_)) => Err(StoreError::incompatible(path)),
        _ => Err(StoreError::invalid_path(path)),
    }
}

fn copy_subtree(conn: &Connection, src: &Path, dst: &Path) -> StoreResult<Bucket> {
    if dst.starts_with(src) {
        return Err(StoreError::invalid_path(dst));
    }
    let parent = match dst.parent() {
        Some(parent) => resolver::ensure_path(conn, &parent)?,
        None => Bucket::ROOT,
    };
    let from = resolver::resolve(conn, src)?;
    if engine::lookup(conn, parent, dst.name())?.is_some() {
        return Err(StoreError::key_exists(dst));
    }
    let to = engine::insert_bucket(conn, parent, dst.name())?;
    copy_contents(conn, from, to)?;
    Ok(to)
}

/// Recursively copy every child of `from` into the empty bucket `to`.
fn copy_contents(conn: &Connection, from: Bucket, to: Bucket) -> StoreResult<()> {
    for (name, entry) in engine::children(conn, from)? {
        match entry {
            Entry::Value(value) => {
                engine::put(conn, to, &name, &value)?;
            }
            Entry::Bucket(child) => {
                let copy = engine::insert_bucket(conn, to, &name)?;
                copy_contents(conn, child, copy)?;
            }
        }
    }
    Ok(())
}
