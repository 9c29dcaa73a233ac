// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::{JobConfig, JobError};
use map_reduce_word_count::word_count_job;
use running_median::running_median_dir;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PASSAGE: &str = "\
It was the best of times, it was the worst of times,
it was the age of wisdom, it was the age of foolishness,
-- it was the epoch of belief --
";

fn config(root: &Path, workers: usize) -> JobConfig {
    JobConfig::default()
        .with_work_dir(root.join("work"))
        .with_output_path(root.join("wc_output").join("wc_result.txt"))
        .with_num_workers(workers)
        .with_lines_per_split(1)
        .with_spill_buffer(8, 0.5)
}

fn setup_input(root: &Path) -> std::path::PathBuf {
    let input = root.join("wc_input");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("dickens.txt"), PASSAGE).unwrap();
    input
}

fn count_of(output: &str, word: &str) -> Option<i64> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(' ')?;
        (key == word).then(|| value.parse().ok()).flatten()
    })
}

// ============================================================
// Word count
// ============================================================

#[test]
fn test_counts_normalized_words() {
    let root = TempDir::new().unwrap();
    let input = setup_input(root.path());
    let config = config(root.path(), 2);
    let output = config.output_path.clone();

    word_count_job(config, true).run(&input).unwrap();
    let result = fs::read_to_string(output).unwrap();

    assert_eq!(count_of(&result, "it"), Some(5));
    assert_eq!(count_of(&result, "was"), Some(5));
    assert_eq!(count_of(&result, "times"), Some(2));
    assert_eq!(count_of(&result, "--"), Some(2));
    assert_eq!(count_of(&result, "It"), None);
    assert_eq!(count_of(&result, "times,"), None);
}

#[test]
fn test_combiner_toggle_gives_identical_output() {
    let root = TempDir::new().unwrap();
    let input = setup_input(root.path());

    let with = config(&root.path().join("with"), 3);
    let without = config(&root.path().join("without"), 3);
    let (with_out, without_out) = (with.output_path.clone(), without.output_path.clone());

    let combined = word_count_job(with, true).run(&input).unwrap();
    let plain = word_count_job(without, false).run(&input).unwrap();

    assert_eq!(
        fs::read_to_string(with_out).unwrap(),
        fs::read_to_string(without_out).unwrap()
    );
    assert_eq!(combined.merge.groups, plain.merge.groups);
    assert!(combined.merge.lines <= plain.merge.lines);
}

#[test]
fn test_empty_input_directory_fails() {
    let root = TempDir::new().unwrap();
    let input = root.path().join("wc_input");
    fs::create_dir_all(&input).unwrap();
    let config = config(root.path(), 2);
    let output = config.output_path.clone();

    let result = word_count_job(config, true).run(&input);

    assert!(matches!(result, Err(JobError::NoInput(_))));
    assert!(!output.exists());
}

// ============================================================
// Word count followed by running median
// ============================================================

#[test]
fn test_median_runs_over_the_same_input() {
    let root = TempDir::new().unwrap();
    let input = setup_input(root.path());
    let config = config(root.path(), 2);
    let median_output = root.path().join("wc_output").join("med_result.txt");

    word_count_job(config, true).run(&input).unwrap();
    let lines = running_median_dir(&input, &median_output).unwrap();

    assert_eq!(lines, 3);
    assert_eq!(fs::read_to_string(median_output).unwrap(), "12\n12\n12\n");
}
