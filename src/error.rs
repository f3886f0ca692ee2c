//! Error types for lsmkv
//!
//! Provides a unified error type for all operations. "Not found" and
//! "deleted" are not errors; they are reported through [`crate::Lookup`].

use thiserror::Error;

/// Result type alias using LsmError
pub type Result<T> = std::result::Result<T, LsmError>;

/// Unified error type for lsmkv operations
#[derive(Debug, Error)]
pub enum LsmError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    CorruptLog(String),

    #[error("SSTable corruption detected: {0}")]
    CorruptTable(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Background Errors
    // -------------------------------------------------------------------------
    #[error("Background task error: {0}")]
    Background(String),

    #[error("Engine halted after fatal error: {0}")]
    Halted(String),
}

impl LsmError {
    /// True for errors that mean on-disk state can no longer be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(self, LsmError::CorruptLog(_) | LsmError::CorruptTable(_))
    }

    /// True for errors after which the engine must stop accepting writes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LsmError::Io(_)) || self.is_corruption()
    }
}
