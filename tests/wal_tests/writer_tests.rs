//! Tests for WAL Writer
//!
//! These tests verify:
//! - Record framing (8-byte little-endian length + body)
//! - Appends accumulate in order
//! - Truncation leaves an empty, still-writable log

use std::fs;
use std::path::PathBuf;

use lsmkv::wal::{WalReader, WalWriter, WriteAheadLog, HEADER_SIZE};
use lsmkv::Entry;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    (temp_dir, wal_path)
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let writer = WalWriter::open(&wal_path).unwrap();

    assert!(wal_path.exists());
    assert_eq!(writer.len().unwrap(), 0);
}

#[test]
fn test_record_framing() {
    let (_temp, wal_path) = setup_temp_wal();
    let entry = Entry::live("key1", b"value1".to_vec());
    let body = entry.encode().unwrap();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&entry).unwrap();

    let raw = fs::read(&wal_path).unwrap();
    assert_eq!(raw.len(), HEADER_SIZE + body.len());

    let declared = i64::from_le_bytes(raw[..HEADER_SIZE].try_into().unwrap());
    assert_eq!(declared as usize, body.len());
    assert_eq!(&raw[HEADER_SIZE..], body.as_slice());
}

#[test]
fn test_appends_preserve_order() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&Entry::live("b", b"2".to_vec())).unwrap();
    writer.append(&Entry::live("a", b"1".to_vec())).unwrap();
    writer.append(&Entry::tombstone("b")).unwrap();

    let entries: Vec<Entry> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        entries,
        vec![
            Entry::live("b", b"2".to_vec()),
            Entry::live("a", b"1".to_vec()),
            Entry::tombstone("b"),
        ]
    );
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(&Entry::live("first", b"1".to_vec())).unwrap();
    }
    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append(&Entry::live("second", b"2".to_vec())).unwrap();
    }

    let count = WalReader::open(&wal_path).unwrap().entries().count();
    assert_eq!(count, 2);
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_truncate_empties_log() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    for i in 0..10 {
        writer.append(&Entry::live(format!("key{}", i), b"v".to_vec())).unwrap();
    }
    assert!(writer.len().unwrap() > 0);

    writer.truncate().unwrap();

    assert!(wal_path.exists());
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
    assert!(writer.is_empty().unwrap());
}

#[test]
fn test_write_after_truncate() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&Entry::live("old", b"1".to_vec())).unwrap();
    writer.truncate().unwrap();
    writer.append(&Entry::live("new", b"2".to_vec())).unwrap();

    let entries: Vec<Entry> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries, vec![Entry::live("new", b"2".to_vec())]);
}

#[test]
fn test_failed_truncate_keeps_log_appendable() {
    let (temp, wal_path) = setup_temp_wal();
    // A directory where the replacement file would be created
    fs::create_dir(temp.path().join("wal.log.tmp")).unwrap();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&Entry::live("a", b"1".to_vec())).unwrap();

    assert!(writer.truncate().is_err());

    writer.append(&Entry::live("b", b"2".to_vec())).unwrap();
    let entries: Vec<Entry> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        entries,
        vec![
            Entry::live("a", b"1".to_vec()),
            Entry::live("b", b"2".to_vec()),
        ]
    );
}

#[test]
fn test_truncate_leaves_no_temp_file() {
    let (temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&Entry::live("a", b"1".to_vec())).unwrap();
    writer.truncate().unwrap();

    assert!(!temp.path().join("wal.log.tmp").exists());
}

// =============================================================================
// Shared Log Tests
// =============================================================================

#[test]
fn test_concurrent_appends_are_all_recorded() {
    use std::sync::Arc;
    use std::thread;

    let (_temp, wal_path) = setup_temp_wal();
    let wal = Arc::new(WriteAheadLog::open(&wal_path).unwrap());

    let mut handles = vec![];
    for t in 0..4 {
        let wal = Arc::clone(&wal);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                wal.append(&Entry::live(format!("t{}_{}", t, i), b"v".to_vec()))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let memtable = wal.replay_into_new_memtable().unwrap();
    assert_eq!(memtable.count(), 100);
}
