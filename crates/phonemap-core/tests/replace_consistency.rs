//! Multi-connection consistency tests for MappingStore::replace_all.
//!
//! A writer and a reader use separate connections to the same file-backed DB,
//! so isolation comes from SQLite transactions, not from the store's mutex.

use phonemap_core::store::MappingStore;
use phonemap_core::StoreError;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn image(prefix: &str, n: usize) -> Vec<(String, String)> {
    (0..n)
        .map(|i| {
            (
                format!("7900{prefix}{:06}", i),
                format!("700000{prefix}{:08}", i),
            )
        })
        .collect()
}

fn as_set(pairs: &[(String, String)]) -> BTreeSet<(String, String)> {
    pairs.iter().cloned().collect()
}

#[test]
fn test_reader_sees_old_or_new_image_never_a_mix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mappings.db");

    let writer = MappingStore::open(&path).unwrap();
    let reader = MappingStore::open(&path).unwrap();

    let old = image("1", 200);
    let new = image("2", 350);
    writer.replace_all(&old).unwrap();

    let old_set = as_set(&old);
    let new_set = as_set(&new);

    let stop = Arc::new(AtomicBool::new(false));
    let reader_handle = {
        let stop = stop.clone();
        let old_set = old_set.clone();
        let new_set = new_set.clone();
        thread::spawn(move || {
            let mut observations = 0usize;
            loop {
                let done = stop.load(Ordering::Relaxed);
                let seen: BTreeSet<(String, String)> = reader
                    .list_all()
                    .unwrap()
                    .into_iter()
                    .map(|m| (m.real_phone, m.fake_phone))
                    .collect();
                assert!(
                    seen == old_set || seen == new_set,
                    "observed a partial image with {} rows",
                    seen.len()
                );
                observations += 1;
                if done {
                    break;
                }
            }
            observations
        })
    };

    for i in 0..40 {
        let next = if i % 2 == 0 { &new } else { &old };
        writer.replace_all(next).unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    let observations = reader_handle.join().unwrap();
    assert!(observations > 0);
    let final_pairs: Vec<(String, String)> = writer
        .list_all()
        .unwrap()
        .into_iter()
        .map(|m| (m.real_phone, m.fake_phone))
        .collect();
    assert_eq!(as_set(&final_pairs), old_set);
}

#[test]
fn test_failed_replace_is_invisible_to_other_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mappings.db");

    let writer = MappingStore::open(&path).unwrap();
    let reader = MappingStore::open(&path).unwrap();

    let old = image("1", 50);
    writer.replace_all(&old).unwrap();

    let mut bad = image("3", 50);
    // duplicate fake at the end trips the constraint after the delete ran
    let dup_fake = bad[0].1.clone();
    bad.push(("79009999999999".to_string(), dup_fake));

    let err = writer.replace_all(&bad).unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation { .. }));

    let seen: BTreeSet<(String, String)> = reader
        .list_all()
        .unwrap()
        .into_iter()
        .map(|m| (m.real_phone, m.fake_phone))
        .collect();
    assert_eq!(seen, as_set(&old));
}
