//! Nested buckets on top of the SQLite engine.
//!
//! Every bucket and key is one row of `entries`:
//!
//! ```text
//! id      INTEGER PRIMARY KEY
//! parent  -> entries(id), ON DELETE CASCADE   (NULL only for the root row)
//! name    BLOB, unique within its parent
//! value   BLOB, NULL marks a nested bucket
//! ```
//!
//! Row `0` is the root namespace. Deleting a bucket row removes its whole
//! subtree through the cascading foreign key. Children come back in byte
//! order of their names (BLOB comparison is `memcmp`).
//!
//! Functions here know nothing about paths; callers attach path context to
//! the outcomes they report.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{StoreError, StoreResult};

/// Current on-disk schema version (`PRAGMA user_version`).
pub(crate) const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE entries (
    id     INTEGER PRIMARY KEY,
    parent INTEGER REFERENCES entries(id) ON DELETE CASCADE,
    name   BLOB NOT NULL,
    value  BLOB,
    CHECK (id = 0 OR (parent IS NOT NULL AND length(name) > 0)),
    UNIQUE (parent, name)
);
INSERT INTO entries (id, parent, name, value) VALUES (0, NULL, x'', NULL);
"#;

/// Handle to a bucket, valid for the store it was resolved in until that
/// bucket is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bucket {
    id: i64,
}

impl Bucket {
    /// The root namespace. Holds only buckets.
    pub(crate) const ROOT: Bucket = Bucket { id: 0 };
}

/// What a name inside a bucket refers to.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Entry {
    Bucket(Bucket),
    Value(Vec<u8>),
}

impl Entry {
    fn from_row(id: i64, value: Option<Vec<u8>>) -> Self {
        match value {
            Some(value) => Entry::Value(value),
            None => Entry::Bucket(Bucket { id }),
        }
    }
}

/// Create the schema on a fresh file, or check the version of an existing one.
pub(crate) fn migrate(conn: &Connection) -> StoreResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            conn.execute_batch(SCHEMA)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tracing::debug!(version = SCHEMA_VERSION, "schema created");
            Ok(())
        }
        v if v <= SCHEMA_VERSION => Ok(()),
        found => Err(StoreError::UnsupportedVersion {
            found,
            expected: SCHEMA_VERSION,
        }),
    }
}

/// Rewrite the root row in place.
///
/// In exclusive locking mode the first write pins the exclusive file lock
/// until the connection closes.
pub(crate) fn touch(conn: &Connection) -> StoreResult<()> {
    conn.execute("UPDATE entries SET value = NULL WHERE id = 0", [])?;
    Ok(())
}

pub(crate) fn lookup(
    conn: &Connection,
    parent: Bucket,
    name: &[u8],
) -> StoreResult<Option<Entry>> {
    let entry = conn
        .prepare_cached("SELECT id, value FROM entries WHERE parent = ?1 AND name = ?2")?
        .query_row(params![parent.id, name], |row| {
            Ok(Entry::from_row(row.get(0)?, row.get(1)?))
        })
        .optional()?;
    Ok(entry)
}

/// Direct children of `bucket`, ordered by name.
pub(crate) fn children(conn: &Connection, bucket: Bucket) -> StoreResult<Vec<(Vec<u8>, Entry)>> {
    let mut stmt = conn
        .prepare_cached("SELECT id, name, value FROM entries WHERE parent = ?1 ORDER BY name")?;
    let rows: Vec<(Vec<u8>, Entry)> = stmt
        .query_map(params![bucket.id], |row| {
            Ok((row.get(1)?, Entry::from_row(row.get(0)?, row.get(2)?)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Insert a new empty bucket. The name must be free.
pub(crate) fn insert_bucket(
    conn: &Connection,
    parent: Bucket,
    name: &[u8],
) -> StoreResult<Bucket> {
    conn.prepare_cached("INSERT INTO entries (parent, name, value) VALUES (?1, ?2, NULL)")?
        .execute(params![parent.id, name])?;
    Ok(Bucket {
        id: conn.last_insert_rowid(),
    })
}

/// Insert or overwrite a value.
///
/// Returns `false` without writing when `name` is a bucket.
pub(crate) fn put(
    conn: &Connection,
    parent: Bucket,
    name: &[u8],
    value: &[u8],
) -> StoreResult<bool> {
    let changed = conn
        .prepare_cached(
            "INSERT INTO entries (parent, name, value) VALUES (?1, ?2, ?3) \
             ON CONFLICT (parent, name) DO UPDATE SET value = excluded.value \
             WHERE entries.value IS NOT NULL",
        )?
        .execute(params![parent.id, name, value])?;
    Ok(changed > 0)
}

/// Remove a value. Returns `true` if one was removed.
pub(crate) fn delete_value(conn: &Connection, parent: Bucket, name: &[u8]) -> StoreResult<bool> {
    let removed = conn
        .prepare_cached(
            "DELETE FROM entries WHERE parent = ?1 AND name = ?2 AND value IS NOT NULL",
        )?
        .execute(params![parent.id, name])?;
    Ok(removed > 0)
}

/// Remove a bucket and its entire subtree. Returns `true` if one was removed.
pub(crate) fn delete_bucket(conn: &Connection, parent: Bucket, name: &[u8]) -> StoreResult<bool> {
    let removed = conn
        .prepare_cached("DELETE FROM entries WHERE parent = ?1 AND name = ?2 AND value IS NULL")?
        .execute(params![parent.id, name])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM entries", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = memory();
        migrate(&conn).unwrap();
        assert_eq!(row_count(&conn), 1);
    }

    #[test]
    fn reject_newer_schema() {
        let conn = memory();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        let err = migrate(&conn).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { .. }));
    }

    #[test]
    fn bucket_and_value_lookup() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        assert!(put(&conn, a, b"k", b"v").unwrap());

        assert_eq!(lookup(&conn, Bucket::ROOT, b"a").unwrap(), Some(Entry::Bucket(a)));
        assert_eq!(
            lookup(&conn, a, b"k").unwrap(),
            Some(Entry::Value(b"v".to_vec()))
        );
        assert_eq!(lookup(&conn, a, b"missing").unwrap(), None);
    }

    #[test]
    fn empty_value_is_not_a_bucket() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        put(&conn, a, b"empty", b"").unwrap();
        assert_eq!(
            lookup(&conn, a, b"empty").unwrap(),
            Some(Entry::Value(Vec::new()))
        );
    }

    #[test]
    fn put_refuses_to_overwrite_bucket() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        let nested = insert_bucket(&conn, a, b"nested").unwrap();
        assert!(!put(&conn, a, b"nested", b"x").unwrap());
        assert_eq!(
            lookup(&conn, a, b"nested").unwrap(),
            Some(Entry::Bucket(nested))
        );
    }

    #[test]
    fn put_overwrites_value() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        put(&conn, a, b"k", b"1").unwrap();
        assert!(put(&conn, a, b"k", b"2").unwrap());
        assert_eq!(lookup(&conn, a, b"k").unwrap(), Some(Entry::Value(b"2".to_vec())));
    }

    #[test]
    fn children_are_byte_ordered() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        put(&conn, a, b"b", b"").unwrap();
        put(&conn, a, b"ab", b"").unwrap();
        insert_bucket(&conn, a, b"a").unwrap();
        put(&conn, a, &[0xff], b"").unwrap();

        let names: Vec<Vec<u8>> = children(&conn, a)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec(), vec![0xff]]
        );
    }

    #[test]
    fn delete_bucket_cascades() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        let b = insert_bucket(&conn, a, b"b").unwrap();
        let c = insert_bucket(&conn, b, b"c").unwrap();
        put(&conn, c, b"k", b"v").unwrap();
        put(&conn, a, b"top", b"v").unwrap();
        assert_eq!(row_count(&conn), 6);

        assert!(delete_bucket(&conn, a, b"b").unwrap());
        // Only the root row, `a`, and `a/top` remain.
        assert_eq!(row_count(&conn), 3);
        assert!(!delete_bucket(&conn, a, b"b").unwrap());
    }

    #[test]
    fn delete_value_ignores_buckets() {
        let conn = memory();
        let a = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        insert_bucket(&conn, a, b"nested").unwrap();
        assert!(!delete_value(&conn, a, b"nested").unwrap());
        assert!(!delete_bucket(&conn, a, b"missing").unwrap());
        put(&conn, a, b"k", b"v").unwrap();
        assert!(!delete_bucket(&conn, a, b"k").unwrap());
        assert!(delete_value(&conn, a, b"k").unwrap());
    }

    #[test]
    fn duplicate_bucket_is_rejected_by_engine() {
        let conn = memory();
        insert_bucket(&conn, Bucket::ROOT, b"a").unwrap();
        let err = insert_bucket(&conn, Bucket::ROOT, b"a").unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
    }

    #[test]
    fn empty_names_are_rejected_by_engine() {
        let conn = memory();
        assert!(insert_bucket(&conn, Bucket::ROOT, b"").is_err());
    }
}
