// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! External k-way merge of spill files followed by the reduce walk.
//!
//! Every spill file is sorted on its own but nothing orders them relative to
//! each other, so the merge keeps one head record per file in a min-heap and
//! always takes the global minimum. Equal keys therefore come out adjacent
//! no matter which worker produced them.

use crate::error::{JobError, Result};
use crate::functions::Reducer;
use crate::record::Record;
use crate::report::MergeStats;
use crate::spill_worker::SpillFile;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sequential reader over one spill file that skips malformed lines
struct SpillReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: u64,
}

impl SpillReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(JobError::io_at("open spill file", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    fn next_record(&mut self, stats: &mut MergeStats) -> Result<Option<Record>> {
        for line in self.lines.by_ref() {
            let line = line.map_err(|e| JobError::io("read spill file", &self.path, e))?;
            self.line_no += 1;
            stats.lines += 1;

            match Record::parse_line(&line) {
                Some(record) => return Ok(Some(record)),
                None => {
                    stats.malformed_lines += 1;
                    warn!(
                        spill = %self.path.display(),
                        line = self.line_no,
                        content = %line,
                        "skipping malformed intermediate record"
                    );
                }
            }
        }
        Ok(None)
    }
}

/// Merges any number of key-sorted spill files into one key-sorted stream
pub struct SpillMerger {
    readers: Vec<SpillReader>,
    heads: BinaryHeap<Reverse<(Record, usize)>>,
    stats: MergeStats,
}

impl SpillMerger {
    pub fn open(spills: &[SpillFile]) -> Result<Self> {
        let paths: Vec<&Path> = spills.iter().map(|s| s.path.as_path()).collect();
        Self::open_paths(&paths)
    }

    pub fn open_paths(paths: &[&Path]) -> Result<Self> {
        let mut merger = Self {
            readers: Vec::with_capacity(paths.len()),
            heads: BinaryHeap::with_capacity(paths.len()),
            stats: MergeStats {
                spill_files: paths.len(),
                ..MergeStats::default()
            },
        };

        for path in paths {
            merger.readers.push(SpillReader::open(path)?);
        }
        for source in 0..merger.readers.len() {
            merger.advance(source)?;
        }
        Ok(merger)
    }

    fn advance(&mut self, source: usize) -> Result<()> {
        if let Some(record) = self.readers[source].next_record(&mut self.stats)? {
            self.heads.push(Reverse((record, source)));
        }
        Ok(())
    }

    /// Smallest record across all spill files, or `None` once all are drained
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(Reverse((record, source))) = self.heads.pop() else {
            return Ok(None);
        };
        self.advance(source)?;
        Ok(Some(record))
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    pub fn into_stats(self) -> MergeStats {
        self.stats
    }
}

/// Walks the merged stream, calling the reducer once per key group
///
/// Reducer output goes to `out` as `"<key> <result>"` lines.
pub fn reduce_merged<R, W>(merger: &mut SpillMerger, reducer: &R, out: &mut W) -> Result<u64>
where
    R: Reducer + ?Sized,
    W: FnMut(Record) -> Result<()>,
{
    let mut groups = 0;
    let mut current: Option<(String, Vec<i64>)> = None;

    while let Some(record) = merger.next_record()? {
        if let Some((key, values)) = current.as_mut() {
            if *key == record.key {
                values.push(record.value);
                continue;
            }
        }

        if let Some((key, values)) = current.replace((record.key, vec![record.value])) {
            out(reducer.reduce(&key, &values))?;
            groups += 1;
        }
    }

    if let Some((key, values)) = current.take() {
        out(reducer.reduce(&key, &values))?;
        groups += 1;
    }

    Ok(groups)
}

/// Merges `spills`, reduces every key group and writes the results to `output`
pub fn merge_reduce_to_file<R>(spills: &[SpillFile], reducer: &R, output: &Path) -> Result<MergeStats>
where
    R: Reducer + ?Sized,
{
    let mut merger = SpillMerger::open(spills)?;

    let file = File::create(output).map_err(JobError::io_at("create output file", output))?;
    let mut writer = BufWriter::new(file);

    let groups = reduce_merged(&mut merger, reducer, &mut |record: Record| {
        writeln!(writer, "{record}").map_err(|e| JobError::io("write output file", output, e))
    })?;

    writer
        .flush()
        .map_err(JobError::io_at("write output file", output))?;

    let mut stats = merger.into_stats();
    stats.groups = groups;
    debug!(
        spill_files = stats.spill_files,
        lines = stats.lines,
        groups = stats.groups,
        malformed = stats.malformed_lines,
        "merge-reduce finished"
    );
    Ok(stats)
}
