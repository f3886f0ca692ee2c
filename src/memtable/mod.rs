//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track distinct key count for flush triggers
//! - Ordered export for SSTable creation and compaction merges
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in a parking_lot RwLock:
//! - Ordered keys (required for SSTable generation)
//! - Balanced, so adversarial key orders cannot degrade lookups
//! - Tombstones are kept as entries so they shadow older SSTables

mod table;

pub use table::MemTable;
