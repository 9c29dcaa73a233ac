// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{JobError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

pub const DEFAULT_LINES_PER_SPLIT: usize = 2000;
pub const DEFAULT_BUFFER_CAPACITY: usize = 32767;
pub const DEFAULT_FLUSH_PERCENT: f64 = 0.8;
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;
pub const FALLBACK_NUM_WORKERS: usize = 4;

/// Everything a job needs to know besides its user functions
///
/// Directory paths are explicit so that independent jobs can run side by
/// side. Two concurrent jobs sharing a split or spill directory are not
/// supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Map workers, and also spill workers (they come in pairs)
    pub num_workers: usize,
    pub lines_per_split: usize,
    /// Nominal spill buffer size, in records
    pub buffer_capacity: usize,
    /// Fraction of `buffer_capacity` that triggers a flush
    pub flush_percent: f64,
    /// Bound of each map-to-spill record channel
    pub queue_capacity: usize,
    pub split_dir: PathBuf,
    pub spill_dir: PathBuf,
    pub output_path: PathBuf,
    /// Leave splits and spill files on disk after the job
    pub keep_intermediates: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            lines_per_split: DEFAULT_LINES_PER_SPLIT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            flush_percent: DEFAULT_FLUSH_PERCENT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            split_dir: PathBuf::from("input_splits"),
            spill_dir: PathBuf::from("mapper_intermediate_result"),
            output_path: PathBuf::from("mr_output").join("result.txt"),
            keep_intermediates: false,
        }
    }
}

/// Host parallelism, or 4 when it cannot be determined
pub fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_NUM_WORKERS)
}

impl JobConfig {
    /// Loads a JSON configuration file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(JobError::io_at("read configuration", path))?;
        serde_json::from_str(&contents).map_err(|source| JobError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Places the split and spill directories under `work_dir`
    pub fn with_work_dir(mut self, work_dir: impl AsRef<Path>) -> Self {
        let work_dir = work_dir.as_ref();
        self.split_dir = work_dir.join("input_splits");
        self.spill_dir = work_dir.join("spills");
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_lines_per_split(mut self, lines_per_split: usize) -> Self {
        self.lines_per_split = lines_per_split;
        self
    }

    pub fn with_spill_buffer(mut self, buffer_capacity: usize, flush_percent: f64) -> Self {
        self.buffer_capacity = buffer_capacity;
        self.flush_percent = flush_percent;
        self
    }

    /// Number of buffered records at which a spill worker flushes
    pub fn flush_threshold(&self) -> usize {
        ((self.buffer_capacity as f64 * self.flush_percent).ceil() as usize).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(JobError::InvalidConfig(msg.to_string()));

        if self.num_workers == 0 {
            return invalid("num_workers must be at least 1");
        }
        if self.lines_per_split == 0 {
            return invalid("lines_per_split must be at least 1");
        }
        if self.buffer_capacity == 0 {
            return invalid("buffer_capacity must be at least 1");
        }
        if !(self.flush_percent > 0.0 && self.flush_percent <= 1.0) {
            return invalid("flush_percent must be in (0, 1]");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity must be at least 1");
        }
        if self.split_dir == self.spill_dir {
            return invalid("split_dir and spill_dir must differ");
        }
        if self.output_path.starts_with(&self.split_dir)
            || self.output_path.starts_with(&self.spill_dir)
        {
            return invalid("output_path must not live in a scratch directory");
        }
        Ok(())
    }

    /// Rejects an input directory that overlaps the split or spill directory
    ///
    /// Scratch directories are removed after every job, so neither may hold
    /// the input nor live inside it. Paths are compared after resolving
    /// symlinks and `..` for the parts that already exist.
    pub fn validate_input_dir(&self, input_dir: impl AsRef<Path>) -> Result<()> {
        let input = resolve_path(input_dir.as_ref());

        let scratch_dirs = [("split_dir", &self.split_dir), ("spill_dir", &self.spill_dir)];
        for (name, scratch) in scratch_dirs {
            let scratch = resolve_path(scratch);
            if input.starts_with(&scratch) || scratch.starts_with(&input) {
                return Err(JobError::InvalidConfig(format!(
                    "{name} '{}' overlaps the input directory '{}'",
                    scratch.display(),
                    input.display()
                )));
            }
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        info!(
            workers = self.num_workers,
            lines_per_split = self.lines_per_split,
            flush_threshold = self.flush_threshold(),
            queue_capacity = self.queue_capacity,
            split_dir = %self.split_dir.display(),
            spill_dir = %self.spill_dir.display(),
            output = %self.output_path.display(),
            "job configuration"
        );
    }
}

/// Absolute form of `path` with its longest existing prefix canonicalized
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            // the missing tail holds no symlinks, so `..` folds lexically
            return missing.iter().rev().fold(canonical, |mut resolved, part| {
                match part {
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    Component::CurDir => {}
                    other => resolved.push(other.as_os_str()),
                }
                resolved
            });
        }
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(last)) => {
                missing.push(last);
                existing = parent;
            }
            _ => break,
        }
    }
    absolute
}
