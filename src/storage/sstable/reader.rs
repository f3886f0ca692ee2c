//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via the in-memory
//! index.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::entry::{Entry, Lookup};
use crate::error::{LsmError, Result};

use super::iterator::SSTableIterator;
use super::{Meta, Position, TRAILER_SIZE};

/// An open, immutable SSTable
///
/// The index is fully resident; the file handle is only touched for live
/// hits and scans. Seek+read pairs on the handle are serialized by `file`.
pub struct SSTable {
    path: PathBuf,
    file: Mutex<File>,
    file_size: u64,
    meta: Meta,
    /// key → position of its entry
    index: HashMap<String, Position>,
    /// Index keys, sorted, for binary search
    keys: Vec<String>,
}

impl std::fmt::Debug for SSTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTable")
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .field("entries", &self.keys.len())
            .finish()
    }
}

impl SSTable {
    pub(super) fn from_parts(
        path: PathBuf,
        file: File,
        file_size: u64,
        meta: Meta,
        index: HashMap<String, Position>,
        keys: Vec<String>,
    ) -> Self {
        Self {
            path,
            file: Mutex::new(file),
            file_size,
            meta,
            index,
            keys,
        }
    }

    /// Open an SSTable for reading
    ///
    /// Reads the trailer from the last 40 bytes, validates the region
    /// geometry, then loads the entire index into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < TRAILER_SIZE {
            return Err(LsmError::CorruptTable(format!(
                "{}: {} bytes is smaller than the trailer",
                path.display(),
                file_size
            )));
        }

        let mut trailer = [0u8; TRAILER_SIZE as usize];
        file.seek(SeekFrom::Start(file_size - TRAILER_SIZE))?;
        file.read_exact(&mut trailer)?;
        let meta = Meta::decode(&trailer)?;
        meta.validate(file_size)?;

        let mut index_bytes = vec![0u8; meta.index_len as usize];
        file.seek(SeekFrom::Start(meta.index_start as u64))?;
        file.read_exact(&mut index_bytes)?;

        let sorted: BTreeMap<String, Position> =
            bincode::deserialize(&index_bytes).map_err(|e| {
                LsmError::CorruptTable(format!("{}: undecodable index: {}", path.display(), e))
            })?;

        for (key, position) in &sorted {
            let in_bounds = position.start >= 0
                && position.len >= 0
                && position
                    .start
                    .checked_add(position.len)
                    .is_some_and(|end| end <= meta.data_len);
            if !in_bounds {
                return Err(LsmError::CorruptTable(format!(
                    "{}: position {:?} of {:?} outside data region",
                    path.display(),
                    position,
                    key
                )));
            }
        }

        let keys: Vec<String> = sorted.keys().cloned().collect();
        let index: HashMap<String, Position> = sorted.into_iter().collect();

        Ok(Self::from_parts(
            path.to_path_buf(),
            file,
            file_size,
            meta,
            index,
            keys,
        ))
    }

    /// Get an entry by key
    ///
    /// Returns:
    /// - `Lookup::Found(entry)`: key holds a live value (one disk read)
    /// - `Lookup::Deleted`: key is a tombstone (no disk read)
    /// - `Lookup::NotFound`: key not in this SSTable
    pub fn get(&self, key: &str) -> Result<Lookup> {
        let found = self
            .keys
            .binary_search_by(|probe| probe.as_str().cmp(key))
            .is_ok();
        if !found {
            return Ok(Lookup::NotFound);
        }

        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                return Err(LsmError::CorruptTable(format!(
                    "{}: key {:?} missing from index",
                    self.path.display(),
                    key
                )))
            }
        };
        if position.deleted {
            return Ok(Lookup::Deleted);
        }

        let bytes = self.read_at(
            self.meta.data_start as u64 + position.start as u64,
            position.len as usize,
        )?;
        let entry = Entry::decode(&bytes).map_err(|e| {
            LsmError::CorruptTable(format!(
                "{}: undecodable entry for {:?}: {}",
                self.path.display(),
                key,
                e
            ))
        })?;
        if entry.key != key {
            return Err(LsmError::CorruptTable(format!(
                "{}: index points {:?} at entry {:?}",
                self.path.display(),
                key,
                entry.key
            )));
        }

        Ok(Lookup::Found(entry))
    }

    /// Iterate over all entries in key order (tombstones included)
    pub fn iter(&self) -> Result<SSTableIterator<'_>> {
        let data = self.read_at(self.meta.data_start as u64, self.meta.data_len as usize)?;
        Ok(SSTableIterator::new(data, &self.keys, &self.index))
    }

    /// Collect all entries in key order (tombstones included)
    pub fn scan(&self) -> Result<Vec<Entry>> {
        self.iter()?.collect()
    }

    /// Delete the file; the open handle keeps serving reads until dropped
    pub fn remove_file(&self) -> Result<()> {
        fs::remove_file(&self.path)?;
        Ok(())
    }

    /// Seek and read `len` bytes under the file lock
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of keys (live and tombstoned)
    pub fn entry_count(&self) -> usize {
        self.keys.len()
    }

    /// Sorted keys of this table
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Index position of a key
    pub fn position(&self, key: &str) -> Option<Position> {
        self.index.get(key).copied()
    }

    /// Size of the file in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Trailer metadata
    pub fn meta(&self) -> Meta {
        self.meta
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Smallest key, if any
    pub fn min_key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    /// Largest key, if any
    pub fn max_key(&self) -> Option<&str> {
        self.keys.last().map(String::as_str)
    }
}
