//! Configuration for lsmkv
//!
//! Centralized configuration with sensible defaults. A `Config` is handed to
//! [`crate::Engine::open`] once and never changes afterwards.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LsmError, Result};

/// Number of levels in the SSTable hierarchy
pub const MAX_LEVELS: usize = 10;

/// Bytes per "MB" when comparing level sizes against `level0_size_mb`
const BYTES_PER_MB: u64 = 1_000_000;

/// Main configuration for an lsmkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── {level}.{seq}.db (SSTable files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Max total size of level 0 in MB; level L allows ten times level L-1
    pub level0_size_mb: u64,

    /// Max SSTables per level before the level is compacted
    pub part_size: usize,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max distinct keys in the memtable before it is flushed
    pub memtable_threshold: usize,

    // -------------------------------------------------------------------------
    // Maintenance Configuration
    // -------------------------------------------------------------------------
    /// Seconds between background flush/compaction checks
    pub check_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./lsmkv_data"),
            level0_size_mb: 1,
            part_size: 3,
            memtable_threshold: 500,
            check_interval_secs: 3,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values that would make flush or compaction spin forever
    pub fn validate(&self) -> Result<()> {
        if self.level0_size_mb == 0 {
            return Err(LsmError::Config("level0_size_mb must be > 0".to_string()));
        }
        if self.part_size == 0 {
            return Err(LsmError::Config("part_size must be > 0".to_string()));
        }
        if self.memtable_threshold == 0 {
            return Err(LsmError::Config(
                "memtable_threshold must be > 0".to_string(),
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(LsmError::Config(
                "check_interval_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval between background maintenance checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Byte budget of a level: `level0_size_mb * 10^level` MB
    pub fn level_max_bytes(&self, level: usize) -> u64 {
        let factor = 10u64.saturating_pow(level as u32);
        self.level0_size_mb
            .saturating_mul(BYTES_PER_MB)
            .saturating_mul(factor)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the level 0 size budget (in MB)
    pub fn level0_size_mb(mut self, mb: u64) -> Self {
        self.config.level0_size_mb = mb;
        self
    }

    /// Set the maximum number of SSTables per level
    pub fn part_size(mut self, count: usize) -> Self {
        self.config.part_size = count;
        self
    }

    /// Set the memtable key-count threshold
    pub fn memtable_threshold(mut self, count: usize) -> Self {
        self.config.memtable_threshold = count;
        self
    }

    /// Set the background check interval (in seconds)
    pub fn check_interval_secs(mut self, secs: u64) -> Self {
        self.config.check_interval_secs = secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
