//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and LevelManager
//! - Handle concurrent read/write access
//! - Expose the two maintenance entry points (flush check, compaction check)
//! - Manage crash recovery on startup

use std::fs;
use std::path::Path;
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::Config;
use crate::entry::{Entry, Lookup};
use crate::error::{LsmError, Result};
use crate::memtable::MemTable;
use crate::storage::{LevelManager, LevelStats, TableInfo};
use crate::wal::{WalRecovery, WriteAheadLog, WAL_FILENAME};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete/flush): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Order inside a write: WAL append → memtable → (flush: levels, WAL truncate)
///   - A write is durable before it becomes visible
///
/// - **Reads** (get): never take `write_lock`
///   - MemTable uses its internal RwLock (many concurrent readers)
///   - LevelManager takes its chain lock shared; each SSTable serializes
///     its own file access
///
/// - **Compaction** only needs the LevelManager's exclusive lock, so it
///   never blocks memtable writes.
///
/// An I/O or corruption error from the WAL, a flush or a compaction halts
/// the engine: later writes and maintenance return `LsmError::Halted`,
/// reads keep working.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log for durability (internal Mutex)
    wal: WriteAheadLog,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Leveled SSTable storage (internal RwLock on the level chains)
    levels: LevelManager,

    /// Serializes write operations (set/delete/flush)
    write_lock: Mutex<()>,

    /// First fatal error; once set, every write is refused
    halted: Mutex<Option<String>>,
}

/// Point-in-time sizes of every tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub memtable_keys: usize,
    pub wal_bytes: u64,
    pub levels: Vec<LevelStats>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config, create data directory
    /// 2. Load existing SSTables from `<level>.<seq>.db` files
    /// 3. Replay the WAL into a fresh memtable
    /// 4. Run one flush check and one compaction check
    pub fn open(config: Config) -> Result<Self> {
        let started = Instant::now();
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;

        let levels = LevelManager::open(&config.data_dir, &config)?;

        let wal_path = config.data_dir.join(WAL_FILENAME);
        let (memtable, recovery) = WalRecovery::replay(&wal_path)?;
        let wal = WriteAheadLog::open(&wal_path)?;

        let engine = Self {
            config,
            wal,
            memtable,
            levels,
            write_lock: Mutex::new(()),
            halted: Mutex::new(None),
        };

        tracing::info!(
            dir = %engine.config.data_dir.display(),
            recovered = recovery.entries_recovered,
            memtable_keys = engine.memtable.count(),
            tables = engine.levels.table_count(),
            elapsed = ?started.elapsed(),
            "engine opened"
        );

        engine.flush_check()?;
        engine.check_and_compact()?;

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Get an entry by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Levels 0 → N-1, newest table first inside a level
    ///
    /// A tombstone in a fresher tier ends the search with `Deleted`.
    pub fn get(&self, key: &str) -> Result<Lookup> {
        match self.memtable.get(key) {
            Lookup::NotFound => self.levels.get(key),
            hit => Ok(hit),
        }
    }

    /// Get just the live value of a key
    pub fn get_value(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(key)?.into_value())
    }

    /// Set a key-value pair
    ///
    /// Returns the previous live memtable entry for the key, if any.
    /// Older values that live only in SSTables are not reported.
    pub fn set(&self, key: &str, value: &[u8]) -> Result<Option<Entry>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_running()?;

        let entry = Entry::live(key, value.to_vec());
        self.halt_on_fatal(self.wal.append(&entry))?;

        tracing::debug!(key, bytes = value.len(), "set");
        Ok(self.memtable.set(entry.key, entry.value.unwrap_or_default()))
    }

    /// Delete a key
    ///
    /// Always records a tombstone so older SSTable values stay hidden.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.delete_and_get(key)?;
        Ok(())
    }

    /// Delete a key and return its previous live memtable entry, if any
    pub fn delete_and_get(&self, key: &str) -> Result<Option<Entry>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_running()?;

        self.halt_on_fatal(self.wal.append(&Entry::tombstone(key)))?;

        tracing::debug!(key, "delete");
        Ok(self.memtable.delete(key))
    }

    /// Flush the memtable if it has reached `memtable_threshold` keys
    ///
    /// Returns the new level-0 table, if one was written.
    pub fn flush_check(&self) -> Result<Option<TableInfo>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_running()?;

        if self.memtable.count() < self.config.memtable_threshold {
            return Ok(None);
        }
        self.halt_on_fatal(self.flush_internal())
    }

    /// Flush the memtable regardless of its size
    pub fn flush(&self) -> Result<Option<TableInfo>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_running()?;
        self.halt_on_fatal(self.flush_internal())
    }

    /// Compact every over-threshold level into the next one
    pub fn check_and_compact(&self) -> Result<Vec<TableInfo>> {
        self.ensure_running()?;
        self.halt_on_fatal(self.levels.check_and_compact())
    }

    /// Refuse to continue once a fatal error has been seen
    fn ensure_running(&self) -> Result<()> {
        match self.halted.lock().as_ref() {
            Some(reason) => Err(LsmError::Halted(reason.clone())),
            None => Ok(()),
        }
    }

    /// Record the first I/O or corruption error; the on-disk state it left
    /// behind is only trusted again after a fresh `open`.
    fn halt_on_fatal<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                let mut halted = self.halted.lock();
                if halted.is_none() {
                    tracing::error!(error = %e, "engine halted");
                    *halted = Some(e.to_string());
                }
            }
        }
        result
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<Option<TableInfo>> {
        if self.memtable.is_empty() {
            return Ok(None);
        }

        // Step 1: Write the memtable as a level-0 SSTable. Writers are
        // blocked, so the export is the whole memtable.
        let info = self.levels.flush_memtable(&self.memtable.export_sorted())?;

        // Step 2: Detach the memtable. Readers saw the same data in both
        // tiers until now, never in neither.
        drop(self.memtable.swap());

        // Step 3: Truncate WAL (entries are now durable in the SSTable)
        self.wal.truncate()?;

        Ok(Some(info))
    }

    /// All live key/value pairs in key order, newest version of each key
    pub fn scan(&self) -> Result<Vec<(String, Vec<u8>)>> {
        // Hold off flushes so no entry moves between tiers mid-scan
        let _write_guard = self.write_lock.lock();

        let merged = MemTable::new();
        self.levels.replay_into(&merged)?;
        for entry in self.memtable.export_sorted() {
            merged.apply(entry);
        }

        Ok(merged
            .into_sorted()
            .into_iter()
            .filter(|entry| !entry.deleted)
            .map(|entry| (entry.key, entry.value.unwrap_or_default()))
            .collect())
    }

    /// Flush any pending data and close
    pub fn close(self) -> Result<()> {
        self.flush()?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Sizes of the memtable, WAL and every level
    pub fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            memtable_keys: self.memtable.count(),
            wal_bytes: self.wal.len()?,
            levels: self.levels.level_stats(),
        })
    }

    /// Get the memtable key count
    pub fn memtable_count(&self) -> usize {
        self.memtable.count()
    }

    /// Get the WAL size in bytes
    pub fn wal_len(&self) -> Result<u64> {
        self.wal.len()
    }

    /// Get the number of SSTables in one level
    pub fn level_table_count(&self, level: usize) -> usize {
        self.levels.level_table_count(level)
    }

    /// Get the number of SSTables across all levels
    pub fn sstable_count(&self) -> usize {
        self.levels.table_count()
    }

    /// Whether a fatal error has stopped all writes
    pub fn is_halted(&self) -> bool {
        self.halted.lock().is_some()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
