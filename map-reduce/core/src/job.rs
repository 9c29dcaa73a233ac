// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::JobConfig;
use crate::counter::SharedCounter;
use crate::error::{JobError, Result};
use crate::functions::{Combiner, Mapper, Reducer};
use crate::map_worker::MapWorker;
use crate::merge::merge_reduce_to_file;
use crate::record::Record;
use crate::report::{JobReport, MapWorkerStats, SpillWorkerStats};
use crate::shutdown_signal::{AtomicShutdownSignal, ShutdownSignal};
use crate::spill_worker::{SpillFile, SpillWorker};
use crate::splitter::{list_input_files, InputSplitter, Split};
use crate::worker_runtime::{spawn_worker, WorkerHandle};
use crossbeam_channel::{bounded, unbounded};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A map-reduce job: splits the input, runs paired map and spill worker
/// pools, then merges the spill files and reduces them into one output file
pub struct Job<M, R, SD = AtomicShutdownSignal> {
    config: JobConfig,
    mapper: Arc<M>,
    reducer: R,
    combiner: Option<Arc<dyn Combiner>>,
    shutdown: SD,
}

impl<M, R> Job<M, R, AtomicShutdownSignal>
where
    M: Mapper,
    R: Reducer,
{
    pub fn new(config: JobConfig, mapper: M, reducer: R) -> Self {
        Self {
            config,
            mapper: Arc::new(mapper),
            reducer,
            combiner: None,
            shutdown: AtomicShutdownSignal::new(),
        }
    }
}

impl<M, R, SD> Job<M, R, SD>
where
    M: Mapper,
    R: Reducer,
    SD: ShutdownSignal,
{
    pub fn with_combiner(mut self, combiner: impl Combiner + 'static) -> Self {
        self.combiner = Some(Arc::new(combiner));
        self
    }

    pub fn with_shutdown_signal<S: ShutdownSignal>(self, shutdown: S) -> Job<M, R, S> {
        Job {
            config: self.config,
            mapper: self.mapper,
            reducer: self.reducer,
            combiner: self.combiner,
            shutdown,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn shutdown_signal(&self) -> &SD {
        &self.shutdown
    }

    /// Runs the job over every regular file of `input_dir`
    ///
    /// On success the output file holds one `"<key> <result>"` line per key in
    /// ascending key order. On failure no output file is left behind. Splits
    /// and spill files are removed in both cases unless the configuration
    /// asks to keep them.
    pub fn run(&self, input_dir: impl AsRef<Path>) -> Result<JobReport> {
        let start = Instant::now();
        let input_dir = input_dir.as_ref();

        self.config.validate()?;
        self.config.validate_input_dir(input_dir)?;
        let input_files = list_input_files(input_dir)?;
        if input_files.is_empty() {
            return Err(JobError::NoInput(input_dir.to_path_buf()));
        }

        info!(input = %input_dir.display(), files = input_files.len(), "=== JOB STARTED ===");
        self.config.log_summary();

        let result = self.execute(&input_files);
        self.cleanup();

        let mut report = result?;
        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            output = %report.output_path.display(),
            groups = report.merge.groups,
            elapsed_ms = report.elapsed_ms,
            "=== JOB FINISHED ==="
        );
        Ok(report)
    }

    fn execute(&self, input_files: &[PathBuf]) -> Result<JobReport> {
        let config = &self.config;

        // SPLIT PHASE
        let splitter = InputSplitter::new(&config.split_dir, config.lines_per_split);
        let splits = splitter.split_files(input_files)?;
        info!(splits = splits.len(), "=== SPLIT PHASE DONE ===");

        fs::create_dir_all(&config.spill_dir)
            .map_err(JobError::io_at("create spill directory", &config.spill_dir))?;

        // MAP + SPILL PHASE
        info!(workers = config.num_workers, "=== MAP PHASE ===");
        let (map_stats, spill_stats, mut spills) = self.run_workers(&splits)?;
        spills.sort_by_key(|s| s.id);
        if self.shutdown.is_cancelled() {
            info!("shutdown requested before merge");
            return Err(JobError::Cancelled);
        }
        info!(
            records = map_stats.records,
            spill_files = spills.len(),
            "all map and spill workers completed"
        );

        // MERGE + REDUCE PHASE
        info!(spill_files = spills.len(), "=== REDUCE PHASE ===");
        let partial = partial_output_path(&config.output_path);
        if let Some(parent) = config.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(JobError::io_at("create output directory", parent))?;
            }
        }

        let merge_stats = match merge_reduce_to_file(&spills, &self.reducer, &partial) {
            Ok(stats) => stats,
            Err(err) => {
                discard_partial(&partial);
                return Err(err);
            }
        };
        if let Err(err) = fs::rename(&partial, &config.output_path) {
            discard_partial(&partial);
            return Err(JobError::io("publish output file", &config.output_path, err));
        }

        Ok(JobReport {
            input_files: input_files.len(),
            splits: splits.len(),
            workers: config.num_workers,
            map: map_stats,
            spill: spill_stats,
            merge: merge_stats,
            output_path: config.output_path.clone(),
            elapsed_ms: 0,
        })
    }

    /// Starts the paired worker pools and waits until every one has finished
    fn run_workers(
        &self,
        splits: &[Split],
    ) -> Result<(MapWorkerStats, SpillWorkerStats, Vec<SpillFile>)> {
        let config = &self.config;

        // Every task is queued and the queue closed before any worker starts,
        // so each map worker drains the real work and then sees end of stream.
        let (task_tx, task_rx) = unbounded::<Split>();
        for split in splits {
            task_tx
                .send(split.clone())
                .map_err(|_| JobError::Disconnected { role: "task", id: 0 })?;
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded::<SpillFile>();
        let counter = SharedCounter::new();
        let flush_threshold = config.flush_threshold();

        let mut spill_handles: Vec<WorkerHandle<SpillWorkerStats>> = Vec::new();
        let mut map_handles: Vec<WorkerHandle<MapWorkerStats>> = Vec::new();
        let mut spawn_error = None;

        for id in 0..config.num_workers {
            let (record_tx, record_rx) = bounded::<Record>(config.queue_capacity);

            let spill_worker = SpillWorker::new(
                id,
                record_rx,
                result_tx.clone(),
                counter.clone(),
                self.combiner.clone(),
                &config.spill_dir,
                flush_threshold,
            );
            match spawn_worker("spill", id, move || spill_worker.run()) {
                Ok(handle) => spill_handles.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }

            let map_worker = MapWorker::new(
                id,
                Arc::clone(&self.mapper),
                task_rx.clone(),
                record_tx,
                self.shutdown.clone(),
            );
            match spawn_worker("map", id, move || map_worker.run()) {
                Ok(handle) => map_handles.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }
        }
        drop(task_rx);
        drop(result_tx);

        debug!(
            map_workers = map_handles.len(),
            spill_workers = spill_handles.len(),
            "worker pools started"
        );

        let mut map_stats = MapWorkerStats::default();
        let mut map_error = None;
        for handle in map_handles {
            let id = handle.id();
            match handle.join() {
                Ok(stats) => map_stats.absorb(&stats),
                Err(err) => {
                    warn!(worker = id, error = %err, "map worker failed");
                    map_error.get_or_insert(err);
                }
            }
        }

        let mut spill_stats = SpillWorkerStats::default();
        let mut spill_error = None;
        for handle in spill_handles {
            let id = handle.id();
            match handle.join() {
                Ok(stats) => spill_stats.absorb(&stats),
                Err(err) => {
                    warn!(worker = id, error = %err, "spill worker failed");
                    spill_error.get_or_insert(err);
                }
            }
        }

        // A map worker that lost its spill worker only reports the symptom,
        // so the spill worker's own failure takes precedence.
        let error = match (spawn_error, spill_error, map_error) {
            (Some(err), _, _) => Some(err),
            (None, Some(err), Some(JobError::Disconnected { .. })) => Some(err),
            (None, spill_err, Some(map_err)) => Some(spill_err.unwrap_or(map_err)),
            (None, spill_err, None) => spill_err,
        };
        if let Some(err) = error {
            return Err(err);
        }

        let spills: Vec<SpillFile> = result_rx.iter().collect();
        Ok((map_stats, spill_stats, spills))
    }

    fn cleanup(&self) {
        if self.config.keep_intermediates {
            info!(
                split_dir = %self.config.split_dir.display(),
                spill_dir = %self.config.spill_dir.display(),
                "keeping intermediate files"
            );
            return;
        }

        for dir in [&self.config.split_dir, &self.config.spill_dir] {
            if dir.exists() {
                if let Err(err) = fs::remove_dir_all(dir) {
                    warn!(dir = %dir.display(), error = %err, "failed to remove scratch directory");
                }
            }
        }
    }
}

fn discard_partial(partial: &Path) {
    if let Err(err) = fs::remove_file(partial) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(file = %partial.display(), error = %err, "failed to remove partial output");
        }
    }
}

fn partial_output_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".partial");
    output.with_file_name(name)
}
