use std::path::PathBuf;

use nest_types::{Path, PathError};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path is empty, malformed, or some prefix does not name a bucket.
    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    /// The destination name is already taken.
    #[error("key exists: {path}")]
    KeyExists { path: String },

    /// Another process holds the store file and the open timeout elapsed.
    #[error("store busy: {} is locked by another process", file.display())]
    StoreBusy { file: PathBuf },

    /// A key operation hit a bucket, or a bucket operation hit a key.
    #[error("incompatible value at {path}")]
    IncompatibleValue { path: String },

    /// The handle has been closed (or a reopen failed).
    #[error("store is closed")]
    Closed,

    /// Failure surfaced by the storage engine.
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// I/O error while preparing the store file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was written by a newer schema than this build understands.
    #[error("unsupported schema version {found} (expected at most {expected})")]
    UnsupportedVersion { found: i64, expected: i64 },

    /// The configuration could not be parsed.
    #[error("invalid config: {0}")]
    Config(String),
}

/// Coarse classification handed to front ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPath,
    KeyExists,
    StoreBusy,
    Engine,
}

impl StoreError {
    pub fn invalid_path(path: &Path) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
        }
    }

    pub fn key_exists(path: &Path) -> Self {
        Self::KeyExists {
            path: path.to_string(),
        }
    }

    pub fn incompatible(path: &Path) -> Self {
        Self::IncompatibleValue {
            path: path.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::KeyExists { .. } => ErrorKind::KeyExists,
            Self::StoreBusy { .. } => ErrorKind::StoreBusy,
            Self::IncompatibleValue { .. }
            | Self::Closed
            | Self::Engine(_)
            | Self::Io(_)
            | Self::UnsupportedVersion { .. }
            | Self::Config(_) => ErrorKind::Engine,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.kind() == ErrorKind::StoreBusy
    }
}

impl From<PathError> for StoreError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath {
            path: err.to_string(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_errors_are_invalid_path() {
        let err: StoreError = Path::parse("").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn engine_variants_classify_as_engine() {
        let path = Path::parse("a/k").unwrap();
        assert_eq!(StoreError::incompatible(&path).kind(), ErrorKind::Engine);
        assert_eq!(StoreError::Closed.kind(), ErrorKind::Engine);
    }

    #[test]
    fn display_names_the_path() {
        let path = Path::parse("a/b").unwrap();
        assert_eq!(StoreError::key_exists(&path).to_string(), "key exists: a/b");
        assert_eq!(
            StoreError::invalid_path(&path).to_string(),
            "invalid path: a/b"
        );
    }
}
