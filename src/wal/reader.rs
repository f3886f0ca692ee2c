//! WAL Reader
//!
//! Parses the length-prefixed record stream of a WAL file.

use std::fs;
use std::path::Path;

use bytes::Buf;

use crate::entry::Entry;
use crate::error::{LsmError, Result};

use super::HEADER_SIZE;

/// Reads records from a WAL file
///
/// The whole log is loaded up front; it never outlives one memtable, so it
/// is bounded by the flush threshold.
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    /// Read records from an in-memory copy of a log
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        let mut remaining = &self.data[self.position..];
        if !remaining.has_remaining() {
            return Ok(None);
        }

        if remaining.remaining() < HEADER_SIZE {
            return Err(LsmError::CorruptLog(format!(
                "truncated record header at offset {}: {} bytes left",
                self.position,
                remaining.remaining()
            )));
        }

        let declared = remaining.get_i64_le();
        if declared < 0 || declared as u64 > remaining.remaining() as u64 {
            return Err(LsmError::CorruptLog(format!(
                "record at offset {} declares {} bytes, {} available",
                self.position,
                declared,
                remaining.remaining()
            )));
        }

        let len = declared as usize;
        let body = &remaining[..len];
        let entry = Entry::decode(body).map_err(|e| {
            LsmError::CorruptLog(format!(
                "undecodable record at offset {}: {}",
                self.position, e
            ))
        })?;

        self.position += HEADER_SIZE + len;
        Ok(Some(entry))
    }

    /// Byte offset of the next record
    pub fn position(&self) -> usize {
        self.position
    }

    /// Iterate over all entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over WAL entries; stops after the first error
pub struct WalIterator {
    reader: WalReader,
    failed: bool,
}

impl Iterator for WalIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
