// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(dead_code)]

use itertools::Itertools;
use map_reduce_core::{JobConfig, Record};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

pub fn identity_mapper(token: &str) -> Record {
    Record::new(token, 1)
}

pub fn sum_reducer(_key: &str, values: &[i64]) -> i64 {
    values.iter().sum()
}

/// Config rooted in `root`: scratch dirs under `root/work`, output in `root/out`
pub fn test_config(root: &Path, num_workers: usize) -> JobConfig {
    JobConfig::default()
        .with_work_dir(root.join("work"))
        .with_output_path(root.join("out").join("result.txt"))
        .with_num_workers(num_workers)
}

pub fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Generate a random lowercase word of up to max_len characters
pub fn generate_random_string(rng: &mut impl Rng, max_len: usize) -> String {
    let len = rng.random_range(1..=max_len);
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..26);
            (b'a' + idx) as char
        })
        .collect()
}

/// Text of `lines` lines with 0..=max_words words each, drawn from a small vocabulary
pub fn generate_corpus(seed: u64, lines: usize, max_words: usize) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let vocabulary: Vec<String> = (0..64)
        .map(|_| generate_random_string(&mut rng, 3))
        .collect();

    let mut text = String::new();
    for _ in 0..lines {
        let words = rng.random_range(0..=max_words);
        let line = (0..words)
            .map(|_| vocabulary[rng.random_range(0..vocabulary.len())].as_str())
            .join(" ");
        text.push_str(&line);
        text.push('\n');
    }
    text
}

/// Single-threaded word count over every file of `dir`, formatted like job output
pub fn reference_word_count(dir: &Path) -> String {
    let mut tokens = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let contents = fs::read_to_string(entry.unwrap().path()).unwrap();
        tokens.extend(contents.split_whitespace().map(str::to_string));
    }

    tokens
        .into_iter()
        .sorted()
        .dedup_with_count()
        .map(|(count, word)| format!("{word} {count}\n"))
        .collect()
}

pub fn read_records(path: &Path) -> Vec<Record> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| Record::parse_line(line).unwrap())
        .collect()
}

pub fn is_sorted_by_key(records: &[Record]) -> bool {
    records
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.key <= b.key)
}
