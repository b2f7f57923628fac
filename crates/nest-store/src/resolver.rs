//! Path resolution inside a transaction.
//!
//! Every function takes the transaction's connection, so a resolve and the
//! mutation that follows it observe the same state.

use rusqlite::Connection;

use nest_types::Path;

use crate::engine::{self, Bucket, Entry};
use crate::error::{StoreError, StoreResult};

/// Walk `path` from the root namespace and return the bucket it names.
///
/// Fails with [`StoreError::InvalidPath`] if any segment is missing or names
/// a key instead of a bucket.
pub fn resolve(conn: &Connection, path: &Path) -> StoreResult<Bucket> {
    let mut bucket = Bucket::ROOT;
    for segment in path.segments() {
        bucket = match engine::lookup(conn, bucket, segment)? {
            Some(Entry::Bucket(next)) => next,
            Some(Entry::Value(_)) | None => return Err(StoreError::invalid_path(path)),
        };
    }
    Ok(bucket)
}

/// Resolve the bucket that holds the last segment of `path`.
///
/// `None` stands for the root namespace, returned for top-level paths.
pub fn resolve_parent(conn: &Connection, path: &Path) -> StoreResult<Option<Bucket>> {
    match path.parent() {
        Some(parent) => resolve(conn, &parent).map(Some),
        None => Ok(None),
    }
}

/// Like [`resolve`], but create every missing bucket along the way.
///
/// Idempotent. A segment already taken by a key fails with
/// [`StoreError::InvalidPath`].
pub fn ensure_path(conn: &Connection, path: &Path) -> StoreResult<Bucket> {
    let mut bucket = Bucket::ROOT;
    for segment in path.segments() {
        bucket = match engine::lookup(conn, bucket, segment)? {
            Some(Entry::Bucket(next)) => next,
            Some(Entry::Value(_)) => return Err(StoreError::invalid_path(path)),
            None => engine::insert_bucket(conn, bucket, segment)?,
        };
    }
    Ok(bucket)
}

/// [`resolve_parent`] with the root namespace made explicit.
pub(crate) fn parent_or_root(conn: &Connection, path: &Path) -> StoreResult<Bucket> {
    Ok(resolve_parent(conn, path)?.unwrap_or(Bucket::ROOT))
}

/// Resolve the bucket holding the key at `path`.
///
/// Keys never live in the root namespace, so a top-level path is invalid.
pub(crate) fn key_parent(conn: &Connection, path: &Path) -> StoreResult<Bucket> {
    resolve_parent(conn, path)?.ok_or_else(|| StoreError::invalid_path(path))
}
