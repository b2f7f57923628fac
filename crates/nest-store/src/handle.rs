//! The [`Store`] handle: the single connection a process holds to a store
//! file, plus the transaction helpers every operation runs inside.

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use tracing::{info, warn};

use nest_types::Path;

use crate::config::StoreConfig;
use crate::engine::{self, Bucket};
use crate::error::{StoreError, StoreResult};
use crate::resolver;

/// Exclusive handle to one store file.
///
/// Opening takes an exclusive lock on the file that is held until the handle
/// is closed or dropped. A second handle on the same file waits up to
/// [`StoreConfig::open_timeout`] and then fails with
/// [`StoreError::StoreBusy`].
///
/// Every mutation runs in exactly one write transaction: it either lands as a
/// whole or leaves the store untouched.
#[derive(Debug)]
pub struct Store {
    conn: Option<Connection>,
    file: PathBuf,
    config: StoreConfig,
    generation: u64,
}

impl Store {
    /// Open (or create) the store file at `file`.
    pub fn open(file: impl AsRef<FsPath>, config: StoreConfig) -> StoreResult<Self> {
        let file = file.as_ref().to_path_buf();
        let conn = connect(&file, &config)?;
        info!(file = %file.display(), "store opened");
        Ok(Self {
            conn: Some(conn),
            file,
            config,
            generation: 0,
        })
    }

    /// The file this handle was last opened on.
    pub fn file(&self) -> &FsPath {
        &self.file
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the connection and its file lock.
    pub fn close(mut self) -> StoreResult<()> {
        self.shutdown()
    }

    /// Close the current file, then open `file` in its place.
    ///
    /// The old lock is released before the new one is taken, so reopening
    /// the same file works. If opening fails the handle stays closed and
    /// every operation returns [`StoreError::Closed`] until a later reopen
    /// succeeds.
    pub fn reopen(&mut self, file: impl AsRef<FsPath>) -> StoreResult<()> {
        self.shutdown()?;
        let file = file.as_ref().to_path_buf();
        let conn = connect(&file, &self.config)?;
        info!(file = %file.display(), "store reopened");
        self.conn = Some(conn);
        self.file = file;
        Ok(())
    }

    /// Run `f` inside a read transaction.
    pub fn view<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let result = f(&tx)?;
        tx.rollback()?;
        Ok(result)
    }

    /// Run `f` inside a write transaction.
    ///
    /// Commits when `f` returns `Ok`; an `Err` drops the transaction, which
    /// rolls back everything `f` wrote.
    pub fn update<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Resolve `path` to a bucket in its own read transaction.
    pub fn resolve(&mut self, path: &Path) -> StoreResult<Bucket> {
        self.view(|tx| resolver::resolve(tx, path))
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn shutdown(&mut self) -> StoreResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Engine(e))?;
            info!(file = %self.file.display(), "store closed");
        }
        Ok(())
    }
}

/// Open `file` and take its exclusive lock.
///
/// A busy or locked result from any step is reported as
/// [`StoreError::StoreBusy`].
fn connect(file: &FsPath, config: &StoreConfig) -> StoreResult<Connection> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    lock_and_migrate(file, config).map_err(|e| match e {
        StoreError::Engine(ref err) if is_busy(err) => {
            warn!(file = %file.display(), timeout = ?config.open_timeout, "store file is locked");
            StoreError::StoreBusy {
                file: file.to_path_buf(),
            }
        }
        other => other,
    })
}

fn lock_and_migrate(file: &FsPath, config: &StoreConfig) -> StoreResult<Connection> {
    let mut conn = Connection::open(file)?;
    conn.busy_timeout(config.open_timeout)?;
    conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", config.synchronous.as_pragma())?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    engine::migrate(&tx)?;
    engine::touch(&tx)?;
    tx.commit()?;

    conn.pragma_update(None, "journal_mode", config.journal_mode.as_pragma())?;
    Ok(conn)
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
