//! # lsmkv
//!
//! An embedded log-structured-merge key-value store with:
//! - Write-Ahead Logging (WAL) for durability of unflushed writes
//! - Crash recovery by WAL replay and SSTable discovery
//! - Ten levels of immutable SSTables with size/count-triggered compaction
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ flush_check
//!                                   ▼
//!                           ┌──────────────┐
//!                           │ LevelManager │ level 0 → 1 → … → 9
//!                           │  (SSTables)  │ check_and_compact
//!                           └──────────────┘
//! ```
//!
//! Maintenance runs only when called: either directly, or on a timer via
//! [`Monitor`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod entry;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;
pub mod typed;
pub mod monitor;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{Engine, EngineStats};
pub use entry::{Entry, Lookup};
pub use error::{LsmError, Result};
pub use monitor::{Monitor, MonitorHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lsmkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
