//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Data Region (variable)                                  │
//! │   [Entry][Entry]...  bincode, ascending key order       │
//! │   (tombstones are stored too, with no value)            │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Region (variable)                                 │
//! │   bincode map: key → Position { start, len, deleted }   │
//! │   start is relative to the data region                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Trailer (40 bytes, always the last 40 bytes)            │
//! │   Version | DataStart | DataLen | IndexStart | IndexLen │
//! │   five little-endian i64                                │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod iterator;
mod reader;

use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{LsmError, Result};

pub use builder::SSTableBuilder;
pub use iterator::SSTableIterator;
pub use reader::SSTable;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Current SSTable format version
pub(crate) const VERSION: i64 = 1;

/// Trailer size: five i64 fields
pub(crate) const TRAILER_SIZE: u64 = 40;

/// File extension of a published SSTable
pub(crate) const TABLE_EXTENSION: &str = "db";

/// Suffix of an SSTable still being written
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

// =============================================================================
// Trailer and Index Types
// =============================================================================

/// Trailer metadata, stored as the final 40 bytes of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meta {
    pub version: i64,
    pub data_start: i64,
    pub data_len: i64,
    pub index_start: i64,
    pub index_len: i64,
}

impl Meta {
    /// Encode into the fixed 40-byte trailer
    pub fn encode(&self) -> [u8; TRAILER_SIZE as usize] {
        let mut out = [0u8; TRAILER_SIZE as usize];
        let mut buf = &mut out[..];
        buf.put_i64_le(self.version);
        buf.put_i64_le(self.data_start);
        buf.put_i64_le(self.data_len);
        buf.put_i64_le(self.index_start);
        buf.put_i64_le(self.index_len);
        out
    }

    /// Decode the fixed 40-byte trailer
    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TRAILER_SIZE as usize {
            return Err(LsmError::CorruptTable(format!(
                "trailer must be {} bytes, got {}",
                TRAILER_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            version: bytes.get_i64_le(),
            data_start: bytes.get_i64_le(),
            data_len: bytes.get_i64_le(),
            index_start: bytes.get_i64_le(),
            index_len: bytes.get_i64_le(),
        })
    }

    /// Check the regions against each other and the file size
    pub fn validate(&self, file_size: u64) -> Result<()> {
        if self.version != VERSION {
            return Err(LsmError::CorruptTable(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if self.data_start < 0 || self.data_len < 0 || self.index_start < 0 || self.index_len < 0
        {
            return Err(LsmError::CorruptTable(format!("negative region in {:?}", self)));
        }

        let data_end = self.data_start.checked_add(self.data_len);
        let index_end = self.index_start.checked_add(self.index_len);
        let body_len = file_size.checked_sub(TRAILER_SIZE);
        match (data_end, index_end, body_len) {
            (Some(data_end), Some(index_end), Some(body_len))
                if data_end <= self.index_start && index_end as u64 == body_len =>
            {
                Ok(())
            }
            _ => Err(LsmError::CorruptTable(format!(
                "regions {:?} inconsistent with file size {}",
                self, file_size
            ))),
        }
    }
}

/// Location of one serialized entry inside the data region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: i64,
    pub len: i64,
    pub deleted: bool,
}

// =============================================================================
// File Naming
// =============================================================================

/// File name of the SSTable at `(level, seq)`: `<level>.<seq>.db`
pub fn table_file_name(level: usize, seq: u64) -> String {
    format!("{}.{}.{}", level, seq, TABLE_EXTENSION)
}

/// Path of the SSTable at `(level, seq)` inside `dir`
pub fn table_path(dir: &Path, level: usize, seq: u64) -> PathBuf {
    dir.join(table_file_name(level, seq))
}

/// Parse `(level, seq)` from a file name
/// "2.17.db" → Some((2, 17))
pub fn parse_table_name(name: &str) -> Option<(usize, u64)> {
    let stem = name.strip_suffix(TABLE_EXTENSION)?.strip_suffix('.')?;
    let (level, seq) = stem.split_once('.')?;
    if level.is_empty() || seq.is_empty() {
        return None;
    }
    if !level.bytes().all(|b| b.is_ascii_digit()) || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let parsed = (level.parse().ok()?, seq.parse().ok()?);
    // "01.0.db" would alias "1.0.db"
    if table_file_name(parsed.0, parsed.1) != name {
        return None;
    }
    Some(parsed)
}
