use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the SQLite entity store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite synchronous mode
    #[serde(default)]
    pub synchronous: SynchronousMode,

    /// Page cache size passed to `PRAGMA cache_size` (negative = KiB)
    /// Default: -16000 (16MB)
    #[serde(default = "default_cache_size")]
    pub cache_size: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SynchronousMode {
    /// fsync on every commit
    Full,
    /// fsync at checkpoints; with WAL a crash can lose the last commits but
    /// never corrupts the projection
    #[default]
    Normal,
    /// Leave flushing to the OS. Fine for a projection that can be rebuilt
    /// by replaying the log
    Off,
}

impl SynchronousMode {
    pub fn as_pragma(self) -> &'static str {
        match self {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        }
    }
}

fn default_wal_mode() -> bool {
    true
}

fn default_cache_size() -> i32 {
    -16000
}

pub(crate) fn default_store_path() -> PathBuf {
    PathBuf::from("./data/betboard.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(default_store_path())
    }
}

impl StoreConfig {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            wal_mode: default_wal_mode(),
            synchronous: SynchronousMode::default(),
            cache_size: default_cache_size(),
        }
    }

    pub fn with_synchronous(mut self, synchronous: SynchronousMode) -> Self {
        self.synchronous = synchronous;
        self
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub fn with_cache_size(mut self, cache_size: i32) -> Self {
        self.cache_size = cache_size;
        self
    }
}
