//! Tests for WAL Reader
//!
//! These tests verify:
//! - Clean end of file
//! - Truncated headers and bodies are reported as corruption
//! - Undecodable bodies are reported as corruption

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use lsmkv::wal::{WalReader, WalWriter};
use lsmkv::{Entry, LsmError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_wal_with_entries(count: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    let mut writer = WalWriter::open(&wal_path).unwrap();
    for i in 0..count {
        writer
            .append(&Entry::live(format!("key{}", i), format!("value{}", i).into_bytes()))
            .unwrap();
    }
    (temp_dir, wal_path)
}

fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

// =============================================================================
// Clean Reads
// =============================================================================

#[test]
fn test_read_empty_log() {
    let mut reader = WalReader::from_bytes(Vec::new());

    assert_eq!(reader.next_entry().unwrap(), None);
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_read_all_entries() {
    let (_temp, wal_path) = setup_wal_with_entries(5);

    let mut reader = WalReader::open(&wal_path).unwrap();
    let mut keys = Vec::new();
    while let Some(entry) = reader.next_entry().unwrap() {
        keys.push(entry.key);
    }

    assert_eq!(keys, vec!["key0", "key1", "key2", "key3", "key4"]);
    assert_eq!(reader.position() as u64, fs::metadata(&wal_path).unwrap().len());
}

// =============================================================================
// Corruption Detection
// =============================================================================

#[test]
fn test_truncated_header_is_corruption() {
    let (_temp, wal_path) = setup_wal_with_entries(2);
    append_raw(&wal_path, &[1, 0, 0]);

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_some());
    assert!(reader.next_entry().unwrap().is_some());

    let err = reader.next_entry().unwrap_err();
    assert!(matches!(err, LsmError::CorruptLog(_)));
}

#[test]
fn test_length_past_end_is_corruption() {
    let (_temp, wal_path) = setup_wal_with_entries(1);
    let mut record = 100i64.to_le_bytes().to_vec();
    record.extend_from_slice(b"short");
    append_raw(&wal_path, &record);

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LsmError::CorruptLog(_))));
}

#[test]
fn test_negative_length_is_corruption() {
    let mut reader = WalReader::from_bytes((-1i64).to_le_bytes().to_vec());

    assert!(matches!(reader.next_entry(), Err(LsmError::CorruptLog(_))));
}

#[test]
fn test_garbage_body_is_corruption() {
    let mut record = 3i64.to_le_bytes().to_vec();
    record.extend_from_slice(&[0xFF, 0xFF, 0xFF]);

    let mut reader = WalReader::from_bytes(record);

    assert!(matches!(reader.next_entry(), Err(LsmError::CorruptLog(_))));
}

#[test]
fn test_iterator_stops_after_error() {
    let mut reader_bytes = 50i64.to_le_bytes().to_vec();
    reader_bytes.extend_from_slice(b"nope");

    let mut iter = WalReader::from_bytes(reader_bytes).entries();

    assert!(iter.next().unwrap().is_err());
    assert!(iter.next().is_none());
}
