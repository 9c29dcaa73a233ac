// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::SharedCounter;
use std::collections::HashSet;
use std::thread;

#[test]
fn test_counter_starts_at_zero_and_increments() {
    let counter = SharedCounter::new();
    assert_eq!(counter.next(), 0);
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.next(), 2);
    assert_eq!(counter.current(), 3);
}

#[test]
fn test_clones_share_the_sequence() {
    let counter = SharedCounter::starting_at(10);
    let other = counter.clone();
    assert_eq!(counter.next(), 10);
    assert_eq!(other.next(), 11);
    assert_eq!(counter.current(), 12);
}

#[test]
fn test_concurrent_ids_are_unique_and_dense() {
    let counter = SharedCounter::new();
    let threads = 8;
    let per_thread = 1000;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || (0..per_thread).map(|_| counter.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "id {id} handed out twice");
        }
    }

    let total = (threads * per_thread) as u64;
    assert_eq!(seen.len() as u64, total);
    assert!(seen.iter().all(|&id| id < total));
}
