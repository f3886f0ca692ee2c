//! SSTable Builder
//!
//! Writes sorted entries to a new SSTable file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::entry::Entry;
use crate::error::{LsmError, Result};

use super::{table_path, Meta, Position, SSTable, TEMP_SUFFIX, VERSION};

/// Builder for creating new SSTables from sorted entries
///
/// Entries are buffered in memory; nothing touches the disk until
/// `finish()`, which writes `<level>.<seq>.db.tmp`, syncs it and renames
/// it into place so a half-written table is never picked up at startup.
pub struct SSTableBuilder {
    /// Final file path
    path: PathBuf,
    /// Serialized entries, in insertion order
    data: Vec<u8>,
    /// Index: key → position in `data`
    index: BTreeMap<String, Position>,
    /// Last key added, for the ordering check
    last_key: Option<String>,
}

impl SSTableBuilder {
    /// Create a builder for the table at `(level, seq)` inside `dir`
    pub fn new(dir: &Path, level: usize, seq: u64) -> Self {
        Self {
            path: table_path(dir, level, seq),
            data: Vec::new(),
            index: BTreeMap::new(),
            last_key: None,
        }
    }

    /// Add an entry (must be called in strictly ascending key order)
    pub fn add(&mut self, entry: &Entry) -> Result<()> {
        if let Some(last) = &self.last_key {
            if entry.key.as_str() <= last.as_str() {
                return Err(LsmError::InvalidInput(format!(
                    "SSTable keys out of order: {:?} after {:?}",
                    entry.key, last
                )));
            }
        }

        let bytes = entry.encode()?;
        let position = Position {
            start: self.data.len() as i64,
            len: bytes.len() as i64,
            deleted: entry.deleted,
        };
        self.data.extend_from_slice(&bytes);
        self.index.insert(entry.key.clone(), position);
        self.last_key = Some(entry.key.clone());
        Ok(())
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if no entries were added
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Finish building: write data, index and trailer, then reopen read-only
    pub fn finish(self) -> Result<SSTable> {
        let index_bytes = bincode::serialize(&self.index)
            .map_err(|e| LsmError::Serialization(e.to_string()))?;

        let data_len = self.data.len() as i64;
        let meta = Meta {
            version: VERSION,
            data_start: 0,
            data_len,
            index_start: data_len,
            index_len: index_bytes.len() as i64,
        };

        let tmp_path = temp_path(&self.path);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&self.data)?;
            file.write_all(&index_bytes)?;
            file.write_all(&meta.encode())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = File::open(&self.path)?;
        let file_size = file.metadata()?.len();
        let keys: Vec<String> = self.index.keys().cloned().collect();

        tracing::debug!(
            path = %self.path.display(),
            entries = keys.len(),
            bytes = file_size,
            "sstable written"
        );

        Ok(SSTable::from_parts(
            self.path,
            file,
            file_size,
            meta,
            self.index.into_iter().collect(),
            keys,
        ))
    }

    /// Build a table from entries that are already sorted and unique
    pub fn build(dir: &Path, level: usize, seq: u64, entries: &[Entry]) -> Result<SSTable> {
        let mut builder = Self::new(dir, level, seq);
        for entry in entries {
            builder.add(entry)?;
        }
        builder.finish()
    }
}

/// `<path>.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
