//! Key operations.
//!
//! Keys always live inside a bucket: a top-level key path is rejected with
//! [`StoreError::InvalidPath`].

use rusqlite::Connection;
use tracing::debug;

use nest_types::Path;

use crate::engine::{self, Bucket, Entry};
use crate::error::{StoreError, StoreResult};
use crate::handle::Store;
use crate::resolver;

impl Store {
    /// Store a new key `name` inside the bucket at `parent`.
    ///
    /// The parent bucket chain is created when missing. Fails with
    /// [`StoreError::KeyExists`] if `name` is already taken there.
    pub fn create_key(&mut self, name: &[u8], value: &[u8], parent: &Path) -> StoreResult<()> {
        let path = parent.child(name)?;
        self.update(|tx| {
            let bucket = resolver::ensure_path(tx, parent)?;
            if engine::lookup(tx, bucket, name)?.is_some() {
                return Err(StoreError::key_exists(&path));
            }
            engine::put(tx, bucket, name, value)?;
            Ok(())
        })?;
        debug!(path = %path, len = value.len(), "key created");
        Ok(())
    }

    /// Give the key at `path` a new name within the same bucket.
    pub fn rename_key(&mut self, path: &Path, new_name: &[u8]) -> StoreResult<()> {
        let target = path.sibling(new_name)?;
        self.update(|tx| {
            let bucket = resolver::key_parent(tx, path)?;
            if engine::lookup(tx, bucket, new_name)?.is_some() {
                return Err(StoreError::key_exists(&target));
            }
            let value = read_value(tx, bucket, path)?;
            engine::put(tx, bucket, new_name, &value)?;
            engine::delete_value(tx, bucket, path.name())?;
            Ok(())
        })?;
        debug!(from = %path, to = %target, "key renamed");
        Ok(())
    }

    /// Delete the key at `path`.
    ///
    /// A missing key is not an error; the parent bucket must exist.
    pub fn delete_key(&mut self, path: &Path) -> StoreResult<()> {
        let removed = self.update(|tx| {
            let bucket = resolver::key_parent(tx, path)?;
            if engine::delete_value(tx, bucket, path.name())? {
                return Ok(true);
            }
            match engine::lookup(tx, bucket, path.name())? {
                Some(Entry::Bucket(_)) => Err(StoreError::incompatible(path)),
                _ => Ok(false),
            }
        })?;
        debug!(path = %path, removed, "key deleted");
        Ok(())
    }

    /// Copy the value at `src` to a new key at `dst`.
    pub fn copy_key(&mut self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.update(|tx| transfer_key(tx, src, dst, false))?;
        debug!(from = %src, to = %dst, "key copied");
        Ok(())
    }

    /// Copy the value at `src` to a new key at `dst`, then delete `src`.
    pub fn move_key(&mut self, src: &Path, dst: &Path) -> StoreResult<()> {
        self.update(|tx| transfer_key(tx, src, dst, true))?;
        debug!(from = %src, to = %dst, "key moved");
        Ok(())
    }

    /// Overwrite (or create) the key at `path` inside an existing bucket.
    pub fn update_key(&mut self, path: &Path, value: &[u8]) -> StoreResult<()> {
        self.update(|tx| {
            let bucket = resolver::key_parent(tx, path)?;
            if !engine::put(tx, bucket, path.name(), value)? {
                return Err(StoreError::incompatible(path));
            }
            Ok(())
        })?;
        debug!(path = %path, len = value.len(), "key updated");
        Ok(())
    }

    /// Read the value stored at `path`.
    pub fn get_key(&mut self, path: &Path) -> StoreResult<Vec<u8>> {
        self.view(|tx| {
            let bucket = resolver::key_parent(tx, path)?;
            read_value(tx, bucket, path)
        })
    }
}

fn read_value(conn: &Connection, bucket: Bucket, path: &Path) -> StoreResult<Vec<u8>> {
    match engine::lookup(conn, bucket, path.name())? {
        Some(Entry::Value(value)) => Ok(value),
        _ => Err(StoreError::invalid_path(path)),
    }
}

/// Write the value read from `src` under `dst`.
///
/// The value is captured before anything is written, and that captured value
/// is what lands at `dst`.
fn transfer_key(
    conn: &Connection,
    src: &Path,
    dst: &Path,
    remove_source: bool,
) -> StoreResult<()> {
    let src_bucket = resolver::key_parent(conn, src)?;
    let value = read_value(conn, src_bucket, src)?;

    let dst_parent = dst.parent().ok_or_else(|| StoreError::invalid_path(dst))?;
    let dst_bucket = resolver::ensure_path(conn, &dst_parent)?;
    if engine::lookup(conn, dst_bucket, dst.name())?.is_some() {
        return Err(StoreError::key_exists(dst));
    }
    engine::put(conn, dst_bucket, dst.name(), &value)?;

    if remove_source {
        engine::delete_value(conn, src_bucket, src.name())?;
    }
    Ok(())
}
