// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-machine map-reduce with bounded-memory spilling and an external
//! k-way merge.

pub mod config;
pub use config::JobConfig;

mod error;
pub use error::{JobError, Result};

pub mod record;
pub use record::Record;

pub mod counter;
pub use counter::SharedCounter;

pub mod functions;
pub use functions::{Combiner, Mapper, Reducer};

pub mod shutdown_signal;
pub use shutdown_signal::{AtomicShutdownSignal, ShutdownSignal};

pub mod worker_runtime;
pub use worker_runtime::{spawn_worker, WorkerHandle};

pub mod splitter;
pub use splitter::{list_input_files, InputSplitter, Split};

pub mod map_worker;
pub use map_worker::MapWorker;

pub mod spill_worker;
pub use spill_worker::{write_spill_file, SpillFile, SpillWorker};

pub mod merge;
pub use merge::{merge_reduce_to_file, reduce_merged, SpillMerger};

pub mod report;
pub use report::{JobReport, MapWorkerStats, MergeStats, SpillWorkerStats};

mod job;
pub use job::Job;
