//! WAL Writer
//!
//! Handles appending length-prefixed records to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

use crate::entry::Entry;
use crate::error::Result;

use super::HEADER_SIZE;

/// Writes records to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
}

impl WalWriter {
    /// Open or create a WAL file in append mode
    pub fn open(path: &Path) -> Result<Self> {
        let file = Self::open_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn open_file(path: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Ok(file)
    }

    /// Encode `entry` as one record and sync it to disk
    pub fn append(&mut self, entry: &Entry) -> Result<()> {
        let body = entry.encode()?;

        // Header and body go out in a single write
        let mut record = BytesMut::with_capacity(HEADER_SIZE + body.len());
        record.put_i64_le(body.len() as i64);
        record.put_slice(&body);

        self.file.write_all(&record)?;
        self.file.sync_data()?;

        tracing::trace!(key = %entry.key, deleted = entry.deleted, "wal append");
        Ok(())
    }

    /// Replace the log with an empty one
    ///
    /// The empty file is created beside the log and renamed over it. Until
    /// the rename succeeds the current handle stays live, so a failure
    /// leaves a log that appends still reach.
    pub fn truncate(&mut self) -> Result<()> {
        let tmp_path = temp_path(&self.path);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        // The new file is empty, so sequential writes from offset 0 append
        self.file = file;

        tracing::info!(path = %self.path.display(), "wal truncated");
        Ok(())
    }

    /// Current size of the log file in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Check if the log file is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `<path>.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
