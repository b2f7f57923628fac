//! A store handle paired with its current snapshot.

use std::path::Path as FsPath;
use std::sync::Arc;

use tracing::warn;

use nest_types::{Node, Snapshot};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::handle::Store;

/// Owns one [`Store`] and the latest [`Snapshot`] taken from it.
///
/// The snapshot is only ever replaced as a whole: after a mutation call
/// [`reload`](Session::reload), or use [`apply`](Session::apply) which does
/// both.
///
/// When a reload fails the snapshot is cleared rather than left showing
/// state the store no longer has, and [`is_stale`](Session::is_stale)
/// reports `true` until a later reload succeeds.
#[derive(Debug)]
pub struct Session {
    store: Store,
    snapshot: Snapshot,
    stale: bool,
}

impl Session {
    /// Open the store file and take the first snapshot.
    pub fn open(file: impl AsRef<FsPath>, config: StoreConfig) -> StoreResult<Self> {
        Self::from_store(Store::open(file, config)?)
    }

    pub fn from_store(mut store: Store) -> StoreResult<Self> {
        let snapshot = store.build_snapshot()?;
        Ok(Self {
            store,
            snapshot,
            stale: false,
        })
    }

    /// Switch to another file and reload.
    ///
    /// The old snapshot is dropped first, so a failed open never leaves
    /// contents of the previous file on display.
    pub fn open_file(&mut self, file: impl AsRef<FsPath>) -> StoreResult<()> {
        self.clear();
        self.store.reopen(file)?;
        self.reload()
    }

    /// Rebuild the snapshot from the store.
    ///
    /// On failure the snapshot is cleared and marked stale.
    pub fn reload(&mut self) -> StoreResult<()> {
        match self.store.build_snapshot() {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Run a mutation against the store, then reload.
    ///
    /// The result is the mutation's own. A mutation that returns `Ok` has
    /// committed, so a failing reload afterwards does not turn it into an
    /// error: the snapshot is cleared, [`is_stale`](Session::is_stale)
    /// becomes `true`, and the reload error is logged. A failed mutation
    /// leaves the snapshot as it was.
    pub fn apply<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Store) -> StoreResult<T>,
    {
        let out = f(&mut self.store)?;
        if let Err(e) = self.reload() {
            warn!(error = %e, "reload after mutation failed; snapshot cleared");
        }
        Ok(out)
    }

    /// `true` when the last reload failed and the snapshot was cleared.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn clear(&mut self) {
        self.snapshot = Snapshot::default();
        self.stale = true;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Look up a node of the current snapshot by its path string.
    pub fn node(&self, path: &str) -> Option<&Arc<Node>> {
        self.snapshot.get(path)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }
}
