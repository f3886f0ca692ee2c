//! MemTable Tests
//!
//! Tests verify:
//! - Basic set/get operations
//! - Previous-value reporting on overwrite
//! - Tombstone handling and key counting
//! - Swap and sorted export
//! - Concurrent access patterns

use lsmkv::memtable::MemTable;
use lsmkv::{Entry, Lookup};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.count(), 0);
    assert!(memtable.is_empty());
    assert!(memtable.export_sorted().is_empty());
}

#[test]
fn test_set_and_get() {
    let memtable = MemTable::new();

    memtable.set("key1", b"value1".to_vec());

    assert_eq!(
        memtable.get("key1"),
        Lookup::Found(Entry::live("key1", b"value1".to_vec()))
    );
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = MemTable::new();

    assert_eq!(memtable.get("nonexistent"), Lookup::NotFound);
}

#[test]
fn test_set_returns_previous_value() {
    let memtable = MemTable::new();

    let first = memtable.set("a", vec![1, 2, 3]);
    let second = memtable.set("a", vec![2, 3, 4]);

    assert_eq!(first, None);
    assert_eq!(second, Some(Entry::live("a", vec![1, 2, 3])));
    assert_eq!(memtable.count(), 1);
    assert_eq!(memtable.get("a"), Lookup::Found(Entry::live("a", vec![2, 3, 4])));
}

#[test]
fn test_set_over_tombstone_reports_no_previous() {
    let memtable = MemTable::new();

    memtable.set("a", b"old".to_vec());
    memtable.delete("a");
    let previous = memtable.set("a", b"new".to_vec());

    assert_eq!(previous, None);
    assert_eq!(memtable.get("a"), Lookup::Found(Entry::live("a", b"new".to_vec())));
}

// =============================================================================
// Delete / Tombstone Tests
// =============================================================================

#[test]
fn test_delete_live_key_returns_previous() {
    let memtable = MemTable::new();

    memtable.set("key1", b"value1".to_vec());
    let previous = memtable.delete("key1");

    assert_eq!(previous, Some(Entry::live("key1", b"value1".to_vec())));
    assert_eq!(memtable.get("key1"), Lookup::Deleted);
    assert_eq!(memtable.count(), 1); // Tombstone still counts as a key
}

#[test]
fn test_delete_nonexistent_key_records_tombstone() {
    let memtable = MemTable::new();

    let previous = memtable.delete("x");

    assert_eq!(previous, None);
    assert_eq!(memtable.get("x"), Lookup::Deleted);
    assert_eq!(memtable.count(), 1);
}

#[test]
fn test_delete_tombstone_is_noop() {
    let memtable = MemTable::new();

    memtable.delete("x");
    let again = memtable.delete("x");

    assert_eq!(again, None);
    assert_eq!(memtable.count(), 1);
    assert_eq!(memtable.export_sorted(), vec![Entry::tombstone("x")]);
}

#[test]
fn test_repeated_deletes_do_not_drift_count() {
    let memtable = MemTable::new();

    for _ in 0..5 {
        memtable.delete("ghost");
    }
    memtable.set("ghost", b"back".to_vec());
    memtable.delete("ghost");

    assert_eq!(memtable.count(), 1);
}

#[test]
fn test_apply_dispatches_on_tombstone_flag() {
    let memtable = MemTable::new();

    memtable.apply(Entry::live("a", b"1".to_vec()));
    memtable.apply(Entry::live("b", b"2".to_vec()));
    memtable.apply(Entry::tombstone("a"));

    assert_eq!(memtable.get("a"), Lookup::Deleted);
    assert_eq!(memtable.get("b"), Lookup::Found(Entry::live("b", b"2".to_vec())));
}

// =============================================================================
// Swap / Export Tests
// =============================================================================

#[test]
fn test_export_sorted_orders_keys() {
    let memtable = MemTable::new();

    memtable.set("cherry", b"3".to_vec());
    memtable.set("apple", b"1".to_vec());
    memtable.delete("banana");

    let keys: Vec<String> = memtable.export_sorted().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["apple", "banana", "cherry"]);
}

#[test]
fn test_swap_detaches_contents() {
    let memtable = MemTable::new();

    memtable.set("a", b"1".to_vec());
    memtable.delete("b");

    let frozen = memtable.swap();

    assert!(memtable.is_empty());
    assert_eq!(memtable.get("a"), Lookup::NotFound);
    assert_eq!(frozen.count(), 2);
    assert_eq!(
        frozen.into_sorted(),
        vec![Entry::live("a", b"1".to_vec()), Entry::tombstone("b")]
    );
}

#[test]
fn test_writes_after_swap_go_to_new_table() {
    let memtable = MemTable::new();

    memtable.set("a", b"1".to_vec());
    let frozen = memtable.swap();
    memtable.set("b", b"2".to_vec());

    assert_eq!(frozen.count(), 1);
    assert_eq!(memtable.count(), 1);
    assert_eq!(frozen.get("b"), Lookup::NotFound);
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn test_empty_key() {
    let memtable = MemTable::new();

    memtable.set("", b"value".to_vec());

    assert_eq!(memtable.get(""), Lookup::Found(Entry::live("", b"value".to_vec())));
}

#[test]
fn test_empty_value() {
    let memtable = MemTable::new();

    memtable.set("key", vec![]);

    assert_eq!(memtable.get("key"), Lookup::Found(Entry::live("key", vec![])));
}

#[test]
fn test_many_entries_adversarial_order() {
    let memtable = MemTable::new();

    // Ascending inserts degrade an unbalanced tree; the map must not care
    for i in 0..5000 {
        memtable.set(format!("key{:05}", i), format!("value{}", i).into_bytes());
    }

    assert_eq!(memtable.count(), 5000);

    let entries = memtable.export_sorted();
    for pair in entries.windows(2) {
        assert!(pair[0].key < pair[1].key);
    }
}

// =============================================================================
// Concurrent Access Tests (Basic)
// =============================================================================

#[test]
fn test_concurrent_reads() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(MemTable::new());
    memtable.set("key", b"value".to_vec());

    let mut handles = vec![];

    for _ in 0..10 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                let result = mt.get("key");
                assert_eq!(result, Lookup::Found(Entry::live("key", b"value".to_vec())));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    use std::sync::Arc;
    use std::thread;

    let memtable = Arc::new(MemTable::new());

    let mut handles = vec![];

    for i in 0..10 {
        let mt = Arc::clone(&memtable);
        let handle = thread::spawn(move || {
            for j in 0..10 {
                mt.set(format!("key{}_{}", i, j), format!("value{}_{}", i, j).into_bytes());
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.count(), 100);
}
