//! Level Manager
//!
//! Tracks the per-level SSTable chains and drives compaction.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup (`<level>.<seq>.db`)
//! - Search levels 0 → N-1, newest → oldest table within a level
//! - Create level-0 SSTables from memtable flushes
//! - Merge an over-threshold level into one SSTable in the next level

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::{Config, MAX_LEVELS};
use crate::entry::{Entry, Lookup};
use crate::error::Result;
use crate::memtable::MemTable;

use super::sstable::{parse_table_name, SSTable, SSTableBuilder, TEMP_SUFFIX};

/// One SSTable in a level chain
#[derive(Debug)]
pub struct LevelTable {
    /// Insertion index within the level, strictly increasing along the chain
    pub seq: u64,
    pub table: SSTable,
}

/// Description of a freshly written table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub level: usize,
    pub seq: u64,
    pub entries: usize,
    pub bytes: u64,
}

/// Size of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelStats {
    pub level: usize,
    pub tables: usize,
    pub bytes: u64,
}

/// Manages the leveled storage layer
///
/// ## Concurrency:
/// - `levels`: RwLock over the chain topology. Lookups take it shared and
///   then rely on each table's own file lock; flush inserts and compactions
///   take it exclusive for their whole duration, so no reader ever sees a
///   level mid-merge.
pub struct LevelManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Max tables per level
    part_size: usize,

    /// Max bytes per level
    level_max_bytes: [u64; MAX_LEVELS],

    /// Level chains, each ordered oldest → newest
    levels: RwLock<Vec<Vec<LevelTable>>>,
}

impl LevelManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove leftover `.tmp` files from interrupted writes
    /// 3. Open every `<level>.<seq>.db` (loads indexes into RAM)
    /// 4. Order each level by sequence ascending
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let started = Instant::now();
        fs::create_dir_all(path)?;

        let mut levels: Vec<Vec<LevelTable>> = (0..MAX_LEVELS).map(|_| Vec::new()).collect();

        for dir_entry in fs::read_dir(path)? {
            let file_path = dir_entry?.path();
            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if name.ends_with(TEMP_SUFFIX) {
                tracing::warn!(path = %file_path.display(), "removing unfinished sstable");
                fs::remove_file(&file_path)?;
                continue;
            }

            let Some((level, seq)) = parse_table_name(name) else {
                continue;
            };
            if level >= MAX_LEVELS {
                tracing::warn!(path = %file_path.display(), level, "ignoring sstable beyond last level");
                continue;
            }

            let table = SSTable::open(&file_path)?;
            levels[level].push(LevelTable { seq, table });
        }

        for chain in levels.iter_mut() {
            chain.sort_by_key(|t| t.seq);
        }

        let mut level_max_bytes = [0u64; MAX_LEVELS];
        for (level, max) in level_max_bytes.iter_mut().enumerate() {
            *max = config.level_max_bytes(level);
        }

        let manager = Self {
            data_dir: path.to_path_buf(),
            part_size: config.part_size,
            level_max_bytes,
            levels: RwLock::new(levels),
        };

        tracing::info!(
            dir = %path.display(),
            tables = manager.table_count(),
            elapsed = ?started.elapsed(),
            "sstables loaded"
        );
        Ok(manager)
    }

    /// Look a key up across all levels
    ///
    /// Level 0 first; inside a level the most recently inserted table first.
    /// The first table that knows the key (live or tombstone) decides.
    pub fn get(&self, key: &str) -> Result<Lookup> {
        let levels = self.levels.read();

        for chain in levels.iter() {
            for level_table in chain.iter().rev() {
                match level_table.table.get(key)? {
                    Lookup::NotFound => continue,
                    hit => return Ok(hit),
                }
            }
        }

        Ok(Lookup::NotFound)
    }

    /// Write sorted entries as a new level-0 table at the tail of level 0
    pub fn flush_memtable(&self, entries: &[Entry]) -> Result<TableInfo> {
        let started = Instant::now();
        let mut levels = self.levels.write();

        let info = self.write_table(&mut levels, 0, entries)?;

        tracing::info!(
            level = info.level,
            seq = info.seq,
            entries = info.entries,
            bytes = info.bytes,
            elapsed = ?started.elapsed(),
            "memtable flushed"
        );
        Ok(info)
    }

    /// Compact every level that is over its table-count or size threshold
    ///
    /// Levels are checked in ascending order, so a level that grows past its
    /// threshold because of an earlier merge in the same pass is compacted
    /// too. The last level is terminal and never compacts.
    /// Returns the tables written.
    pub fn check_and_compact(&self) -> Result<Vec<TableInfo>> {
        let mut written = Vec::new();

        for level in 0..MAX_LEVELS - 1 {
            let mut levels = self.levels.write();
            if !self.over_threshold(&levels, level) {
                continue;
            }
            if let Some(info) = self.compact_locked(&mut levels, level)? {
                written.push(info);
            }
        }

        Ok(written)
    }

    /// Merge every table of `level` into one table in `level + 1`
    ///
    /// Ignores thresholds. Returns `None` when the level is empty or is the
    /// terminal level.
    pub fn compact_level(&self, level: usize) -> Result<Option<TableInfo>> {
        let mut levels = self.levels.write();
        self.compact_locked(&mut levels, level)
    }

    /// Apply every stored entry, oldest first, to `target`
    ///
    /// Highest level first; inside a level in insertion order, so newer
    /// records override older ones.
    pub fn replay_into(&self, target: &MemTable) -> Result<()> {
        let levels = self.levels.read();
        for chain in levels.iter().rev() {
            for level_table in chain {
                for entry in level_table.table.iter()? {
                    target.apply(entry?);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of tables in one level
    pub fn level_table_count(&self, level: usize) -> usize {
        self.levels.read().get(level).map_or(0, Vec::len)
    }

    /// Sequence numbers of one level, oldest first
    pub fn level_seqs(&self, level: usize) -> Vec<u64> {
        self.levels
            .read()
            .get(level)
            .map(|chain| chain.iter().map(|t| t.seq).collect())
            .unwrap_or_default()
    }

    /// Number of tables across all levels
    pub fn table_count(&self) -> usize {
        self.levels.read().iter().map(Vec::len).sum()
    }

    /// Per-level table counts and sizes
    pub fn level_stats(&self) -> Vec<LevelStats> {
        self.levels
            .read()
            .iter()
            .enumerate()
            .map(|(level, chain)| LevelStats {
                level,
                tables: chain.len(),
                bytes: chain_size(chain),
            })
            .collect()
    }

    /// Byte budget of a level
    pub fn level_max_bytes(&self, level: usize) -> u64 {
        self.level_max_bytes.get(level).copied().unwrap_or(u64::MAX)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn over_threshold(&self, levels: &[Vec<LevelTable>], level: usize) -> bool {
        let chain = &levels[level];
        chain.len() > self.part_size || chain_size(chain) > self.level_max_bytes[level]
    }

    /// Build a table and append it to `level` (write lock held)
    fn write_table(
        &self,
        levels: &mut [Vec<LevelTable>],
        level: usize,
        entries: &[Entry],
    ) -> Result<TableInfo> {
        let seq = levels[level].last().map_or(0, |t| t.seq + 1);
        let table = SSTableBuilder::build(&self.data_dir, level, seq, entries)?;

        let info = TableInfo {
            level,
            seq,
            entries: table.entry_count(),
            bytes: table.file_size(),
        };
        levels[level].push(LevelTable { seq, table });
        Ok(info)
    }

    /// Merge `level` into `level + 1` (write lock held)
    ///
    /// The merged table is durable before any source file is deleted.
    fn compact_locked(
        &self,
        levels: &mut [Vec<LevelTable>],
        level: usize,
    ) -> Result<Option<TableInfo>> {
        if level + 1 >= MAX_LEVELS || levels[level].is_empty() {
            return Ok(None);
        }

        let started = Instant::now();
        let source_tables = levels[level].len();
        let source_bytes = chain_size(&levels[level]);

        // Oldest table first so later sets and deletes win
        let merged = MemTable::new();
        for level_table in &levels[level] {
            for entry in level_table.table.iter()? {
                merged.apply(entry?);
            }
        }
        let entries = merged.into_sorted();

        let info = self.write_table(levels, level + 1, &entries)?;

        // Oldest first, and a table leaves the chain only once its file is
        // gone. On failure the survivors are the newest tables of the level,
        // so they shadow nothing newer and their sequence numbers stay taken.
        while let Some(oldest) = levels[level].first() {
            oldest.table.remove_file()?;
            levels[level].remove(0);
        }

        tracing::info!(
            from_level = level,
            to_level = info.level,
            seq = info.seq,
            source_tables,
            source_bytes,
            entries = info.entries,
            bytes = info.bytes,
            elapsed = ?started.elapsed(),
            "level compacted"
        );
        Ok(Some(info))
    }
}

fn chain_size(chain: &[LevelTable]) -> u64 {
    chain.iter().map(|t| t.table.file_size()).sum()
}
