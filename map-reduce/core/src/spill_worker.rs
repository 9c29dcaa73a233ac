// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::counter::SharedCounter;
use crate::error::{JobError, Result};
use crate::functions::Combiner;
use crate::record::Record;
use crate::report::SpillWorkerStats;
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A sorted run written by one spill worker flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillFile {
    pub id: u64,
    pub path: PathBuf,
    pub worker: usize,
    pub records: usize,
}

/// Spill worker: buffers the records of one map worker and flushes them to
/// disk as key-sorted spill files
pub struct SpillWorker {
    id: usize,
    input: Receiver<Record>,
    results: Sender<SpillFile>,
    counter: SharedCounter,
    combiner: Option<Arc<dyn Combiner>>,
    spill_dir: PathBuf,
    flush_threshold: usize,
    buffer: HashMap<String, Vec<i64>>,
    buffered: usize,
    stats: SpillWorkerStats,
}

impl SpillWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        input: Receiver<Record>,
        results: Sender<SpillFile>,
        counter: SharedCounter,
        combiner: Option<Arc<dyn Combiner>>,
        spill_dir: impl Into<PathBuf>,
        flush_threshold: usize,
    ) -> Self {
        Self {
            id,
            input,
            results,
            counter,
            combiner,
            spill_dir: spill_dir.into(),
            flush_threshold: flush_threshold.max(1),
            buffer: HashMap::new(),
            buffered: 0,
            stats: SpillWorkerStats::default(),
        }
    }

    /// Consumes records until every sender is gone, then flushes what is left
    pub fn run(mut self) -> Result<SpillWorkerStats> {
        while let Ok(record) = self.input.recv() {
            self.buffer.entry(record.key).or_default().push(record.value);
            self.buffered += 1;
            self.stats.records_in += 1;

            if self.buffered >= self.flush_threshold {
                self.flush()?;
            }
        }

        if !self.buffer.is_empty() {
            self.flush()?;
        }

        debug!(
            worker = self.id,
            flushes = self.stats.flushes,
            records = self.stats.records_in,
            "spill worker finished"
        );
        Ok(self.stats)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(combiner) = &self.combiner {
            for (key, values) in self.buffer.iter_mut() {
                let combined = combiner.combine(key, values);
                values.clear();
                values.push(combined);
            }
        }

        let mut entries: Vec<(String, Vec<i64>)> = self.buffer.drain().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.buffered = 0;

        let id = self.counter.next();
        let path = self.spill_dir.join(format!("spill_{id}"));
        let records = write_spill_file(&path, &entries)?;

        self.stats.flushes += 1;
        self.stats.records_out += records as u64;
        debug!(
            worker = self.id,
            spill = id,
            keys = entries.len(),
            records,
            "flushed spill file"
        );

        let spill = SpillFile {
            id,
            path,
            worker: self.id,
            records,
        };
        self.results.send(spill).map_err(|_| JobError::Disconnected {
            role: "spill",
            id: self.id,
        })
    }
}

/// Writes key-sorted entries as `"<key> <value>"` lines, returning the line count
pub fn write_spill_file(path: &Path, entries: &[(String, Vec<i64>)]) -> Result<usize> {
    let file = File::create(path).map_err(JobError::io_at("create spill file", path))?;
    let mut writer = BufWriter::new(file);
    let mut records = 0;
    let mut previous: Option<&str> = None;

    for (key, values) in entries {
        debug_assert!(previous.map_or(true, |p| p <= key.as_str()));
        previous = Some(key.as_str());

        for value in values {
            writeln!(writer, "{key} {value}")
                .map_err(|e| JobError::io("write spill file", path, e))?;
            records += 1;
        }
    }

    writer
        .flush()
        .map_err(JobError::io_at("write spill file", path))?;
    Ok(records)
}
