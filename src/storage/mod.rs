//! Storage Module
//!
//! Persistent storage layer: immutable SSTables arranged in levels.
//!
//! ## Responsibilities
//! - Persist memtable snapshots to disk in sorted format
//! - Point lookups through each table's in-memory index
//! - Level-by-level compaction bounded by table count and byte size
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── wal.log
//!   ├── 0.0.db      level 0, sequence 0 (oldest flush)
//!   ├── 0.1.db
//!   └── 1.0.db      level 1, output of a level-0 compaction
//! ```

pub mod sstable;
mod manager;

pub use manager::{LevelManager, LevelStats, LevelTable, TableInfo};
pub use sstable::{Meta, Position, SSTable, SSTableBuilder, SSTableIterator};
