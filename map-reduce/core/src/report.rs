// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::Serialize;
use std::path::PathBuf;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MapWorkerStats {
    pub splits: usize,
    pub tokens: u64,
    pub records: u64,
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpillWorkerStats {
    pub records_in: u64,
    pub records_out: u64,
    pub flushes: u64,
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub spill_files: usize,
    pub lines: u64,
    pub groups: u64,
    pub malformed_lines: u64,
}

/// Summary of a finished job
#[derive(Default, Clone, Debug, Serialize)]
pub struct JobReport {
    pub input_files: usize,
    pub splits: usize,
    pub workers: usize,
    pub map: MapWorkerStats,
    pub spill: SpillWorkerStats,
    pub merge: MergeStats,
    pub output_path: PathBuf,
    pub elapsed_ms: u64,
}

impl MapWorkerStats {
    pub fn absorb(&mut self, other: &MapWorkerStats) {
        self.splits += other.splits;
        self.tokens += other.tokens;
        self.records += other.records;
    }
}

impl SpillWorkerStats {
    pub fn absorb(&mut self, other: &SpillWorkerStats) {
        self.records_in += other.records_in;
        self.records_out += other.records_out;
        self.flushes += other.flushes;
    }
}
