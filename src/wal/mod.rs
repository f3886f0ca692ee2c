//! Write-Ahead Log (WAL) Module
//!
//! Provides durability for memtable contents that have not reached an
//! SSTable yet.
//!
//! ## Responsibilities
//! - Append every Set/Delete before it is applied to the memtable
//! - Replay the log into a fresh memtable on startup
//! - Truncate once a flush has made the log's contents durable elsewhere
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Record 1                                 │
//! │ ┌───────────────┬──────────────────────┐ │
//! │ │ Len: i64 (8)  │ Entry (Len bytes)    │ │
//! │ └───────────────┴──────────────────────┘ │
//! ├──────────────────────────────────────────┤
//! │ Record 2 ...                             │
//! └──────────────────────────────────────────┘
//! ```
//! Lengths are little-endian; a record whose length runs past the end of
//! the file is corruption.

mod reader;
mod recovery;
mod writer;

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::entry::Entry;
use crate::error::Result;
use crate::memtable::MemTable;

pub use reader::WalReader;
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;

/// Size of the length prefix in front of every record
pub const HEADER_SIZE: usize = 8;

/// Default log file name inside the data directory
pub const WAL_FILENAME: &str = "wal.log";

/// Thread-safe write-ahead log
///
/// One mutex serializes Append and Truncate so records never reorder.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
}

impl WriteAheadLog {
    /// Open (or create) the log at `path` for appending
    pub fn open(path: &Path) -> Result<Self> {
        let writer = WalWriter::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Append one entry and sync it to storage before returning
    pub fn append(&self, entry: &Entry) -> Result<()> {
        self.writer.lock().append(entry)
    }

    /// Rebuild a memtable from the log, in file order
    pub fn replay_into_new_memtable(&self) -> Result<MemTable> {
        // Hold the writer lock so no append races the read.
        let _writer = self.writer.lock();
        let (memtable, _) = WalRecovery::replay(&self.path)?;
        Ok(memtable)
    }

    /// Drop every record: delete the file and start an empty one
    pub fn truncate(&self) -> Result<()> {
        self.writer.lock().truncate()
    }

    /// Current size of the log file in bytes
    pub fn len(&self) -> Result<u64> {
        self.writer.lock().len()
    }

    /// Check if the log holds no records
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
