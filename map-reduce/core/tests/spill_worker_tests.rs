// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod common;

use common::{is_sorted_by_key, read_records, sum_reducer};
use crossbeam_channel::unbounded;
use map_reduce_core::{Combiner, Record, SharedCounter, SpillFile, SpillWorker, SpillWorkerStats};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn run_spill_worker(
    spill_dir: &Path,
    threshold: usize,
    combiner: Option<Arc<dyn Combiner>>,
    records: Vec<Record>,
) -> (SpillWorkerStats, Vec<SpillFile>) {
    fs::create_dir_all(spill_dir).unwrap();
    let (record_tx, record_rx) = unbounded();
    let (result_tx, result_rx) = unbounded();

    for record in records {
        record_tx.send(record).unwrap();
    }
    drop(record_tx);

    let worker = SpillWorker::new(
        0,
        record_rx,
        result_tx,
        SharedCounter::new(),
        combiner,
        spill_dir,
        threshold,
    );
    let stats = worker.run().unwrap();
    let spills: Vec<SpillFile> = result_rx.iter().collect();
    (stats, spills)
}

fn repeated(key: &str, count: usize) -> Vec<Record> {
    (0..count).map(|_| Record::new(key, 1)).collect()
}

// ============================================================
// Flush threshold
// ============================================================

#[test]
fn test_threshold_three_five_records_gives_one_mid_stream_and_final_flush() {
    let dir = TempDir::new().unwrap();
    let (stats, spills) = run_spill_worker(dir.path(), 3, None, repeated("k", 5));

    assert_eq!(spills.len(), 2);
    assert_eq!(stats.flushes, 2);
    assert_eq!(spills[0].records, 3);
    assert_eq!(spills[1].records, 2);
    assert_eq!(spills[0].path, dir.path().join("spill_0"));
    assert_eq!(spills[1].path, dir.path().join("spill_1"));
}

#[test]
fn test_threshold_two_five_records_flushes_every_two_records() {
    let dir = TempDir::new().unwrap();
    let (_, spills) = run_spill_worker(dir.path(), 2, None, repeated("k", 5));

    assert_eq!(
        spills.iter().map(|s| s.records).collect::<Vec<_>>(),
        vec![2, 2, 1]
    );

    let values: i64 = spills
        .iter()
        .flat_map(|s| read_records(&s.path))
        .map(|r| r.value)
        .sum();
    assert_eq!(values, 5);
}

#[test]
fn test_exact_multiple_of_threshold_has_no_empty_final_flush() {
    let dir = TempDir::new().unwrap();
    let (stats, spills) = run_spill_worker(dir.path(), 2, None, repeated("k", 4));

    assert_eq!(spills.len(), 2);
    assert_eq!(stats.flushes, 2);
}

#[test]
fn test_no_records_writes_no_spill_files() {
    let dir = TempDir::new().unwrap();
    let (stats, spills) = run_spill_worker(dir.path(), 2, None, Vec::new());

    assert!(spills.is_empty());
    assert_eq!(stats, SpillWorkerStats::default());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ============================================================
// Spill file contents
// ============================================================

#[test]
fn test_spill_files_are_sorted_by_key() {
    let dir = TempDir::new().unwrap();
    let records = ["pear", "apple", "fig", "apple", "banana", "fig", "cherry"]
        .iter()
        .map(|w| Record::new(*w, 1))
        .collect();

    let (_, spills) = run_spill_worker(dir.path(), 4, None, records);

    assert_eq!(spills.len(), 2);
    for spill in &spills {
        assert!(is_sorted_by_key(&read_records(&spill.path)));
    }
    assert_eq!(
        fs::read_to_string(&spills[0].path).unwrap(),
        "apple 1\napple 1\nfig 1\npear 1\n"
    );
}

#[test]
fn test_values_of_one_key_keep_arrival_order() {
    let dir = TempDir::new().unwrap();
    let records = vec![Record::new("k", 3), Record::new("k", 1), Record::new("k", 2)];

    let (_, spills) = run_spill_worker(dir.path(), 10, None, records);

    assert_eq!(fs::read_to_string(&spills[0].path).unwrap(), "k 3\nk 1\nk 2\n");
}

// ============================================================
// Combiner
// ============================================================

#[test]
fn test_combiner_collapses_each_key_per_flush() {
    let dir = TempDir::new().unwrap();
    let mut records = repeated("b", 3);
    records.extend(repeated("a", 2));
    let combiner: Arc<dyn Combiner> = Arc::new(sum_reducer);

    let (stats, spills) = run_spill_worker(dir.path(), 10, Some(combiner), records);

    assert_eq!(spills.len(), 1);
    assert_eq!(fs::read_to_string(&spills[0].path).unwrap(), "a 2\nb 3\n");
    assert_eq!(stats.records_in, 5);
    assert_eq!(stats.records_out, 2);
}

#[test]
fn test_combiner_runs_independently_for_each_flush() {
    let dir = TempDir::new().unwrap();
    let combiner: Arc<dyn Combiner> = Arc::new(sum_reducer);

    let (_, spills) = run_spill_worker(dir.path(), 2, Some(combiner), repeated("k", 5));

    let contents: Vec<String> = spills
        .iter()
        .map(|s| fs::read_to_string(&s.path).unwrap())
        .collect();
    assert_eq!(contents, vec!["k 2\n", "k 2\n", "k 1\n"]);
}

// ============================================================
// Shared numbering
// ============================================================

#[test]
fn test_workers_sharing_a_counter_never_reuse_ids() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path()).unwrap();
    let counter = SharedCounter::new();
    let (result_tx, result_rx) = unbounded();

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let (record_tx, record_rx) = unbounded();
            for i in 0..10 {
                record_tx.send(Record::new(format!("w{id}k{i}"), 1)).unwrap();
            }
            drop(record_tx);
            let worker = SpillWorker::new(
                id,
                record_rx,
                result_tx.clone(),
                counter.clone(),
                None,
                dir.path(),
                3,
            );
            std::thread::spawn(move || worker.run().unwrap())
        })
        .collect();
    drop(result_tx);

    for handle in handles {
        handle.join().unwrap();
    }

    let mut ids: Vec<u64> = result_rx.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..16).collect::<Vec<_>>());
}
