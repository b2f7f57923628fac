//! Store settings, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Durability level applied to every write transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// Hand writes to the OS and never wait for the disk.
    Off,
    /// Sync at the most critical moments only.
    Normal,
    /// Sync on every commit.
    #[default]
    Full,
}

impl Synchronous {
    pub(crate) fn as_pragma(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }
}

/// Rollback journal strategy of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Delete,
    Truncate,
    Wal,
}

impl JournalMode {
    pub(crate) fn as_pragma(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Wal => "WAL",
        }
    }
}

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long to wait for another process to release the store file
    /// before giving up with [`StoreError::StoreBusy`].
    #[serde(with = "millis")]
    pub open_timeout: Duration,
    /// Sync/flush strategy.
    pub synchronous: Synchronous,
    /// Journal strategy.
    pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(1),
            synchronous: Synchronous::default(),
            journal_mode: JournalMode::default(),
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    ///
    /// ```
    /// use std::time::Duration;
    /// use nest_store::StoreConfig;
    ///
    /// let config = StoreConfig::from_toml_str("open_timeout = 250").unwrap();
    /// assert_eq!(config.open_timeout, Duration::from_millis(250));
    /// ```
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

/// Durations as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
