//! Materialize the whole store into a [`Snapshot`].

use rusqlite::Connection;
use tracing::{debug, warn};

use nest_types::{Node, Path, Snapshot};

use crate::engine::{self, Bucket, Entry};
use crate::error::StoreResult;
use crate::handle::Store;

impl Store {
    /// Read every bucket and key in one read transaction.
    ///
    /// Each call yields a snapshot with a fresh generation. Nothing from an
    /// earlier snapshot is reused.
    pub fn build_snapshot(&mut self) -> StoreResult<Snapshot> {
        let roots = self.view(|tx| {
            let mut roots = Vec::new();
            for (name, entry) in engine::children(tx, Bucket::ROOT)? {
                let path = Path::top_level(name)?;
                match entry {
                    Entry::Bucket(bucket) => roots.push(materialize(tx, path, bucket)?),
                    Entry::Value(_) => warn!(path = %path, "skipping value in root namespace"),
                }
            }
            Ok(roots)
        })?;
        let snapshot = Snapshot::new(self.next_generation(), roots);
        debug!(
            generation = snapshot.generation(),
            entries = snapshot.index().len(),
            "snapshot built"
        );
        Ok(snapshot)
    }
}

fn materialize(conn: &Connection, path: Path, bucket: Bucket) -> StoreResult<Node> {
    let mut children = Vec::new();
    for (name, entry) in engine::children(conn, bucket)? {
        let child = path.child(name)?;
        children.push(match entry {
            Entry::Value(value) => Node::key(child, value),
            Entry::Bucket(nested) => materialize(conn, child, nested)?,
        });
    }
    Ok(Node::bucket(path, children))
}
