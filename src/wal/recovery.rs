//! WAL Recovery
//!
//! Rebuilds the memtable on startup by replaying the WAL.

use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::memtable::MemTable;

use super::WalReader;

/// Replays a WAL into a memtable
pub struct WalRecovery;

/// Result of a replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records applied
    pub entries_recovered: u64,

    /// Number of those records that were tombstones
    pub tombstones_recovered: u64,

    /// Bytes of log consumed
    pub bytes_read: u64,
}

impl WalRecovery {
    /// Replay every record of the log at `path` into a fresh memtable
    ///
    /// A missing file replays as empty. Any framing or decoding problem is
    /// returned as `CorruptLog`; nothing is skipped.
    pub fn replay(path: &Path) -> Result<(MemTable, RecoveryResult)> {
        let started = Instant::now();
        let memtable = MemTable::new();
        let mut result = RecoveryResult::default();

        if !path.exists() {
            return Ok((memtable, result));
        }

        let mut reader = WalReader::open(path)?;
        while let Some(entry) = reader.next_entry()? {
            if entry.deleted {
                result.tombstones_recovered += 1;
            }
            memtable.apply(entry);
            result.entries_recovered += 1;
        }
        result.bytes_read = reader.position() as u64;

        tracing::info!(
            path = %path.display(),
            entries = result.entries_recovered,
            tombstones = result.tombstones_recovered,
            keys = memtable.count(),
            elapsed = ?started.elapsed(),
            "wal replayed"
        );

        Ok((memtable, result))
    }
}
