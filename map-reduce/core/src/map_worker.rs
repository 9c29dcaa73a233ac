// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{JobError, Result};
use crate::functions::Mapper;
use crate::record::Record;
use crate::report::MapWorkerStats;
use crate::shutdown_signal::ShutdownSignal;
use crate::splitter::Split;
use crossbeam_channel::{Receiver, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use tracing::{debug, info};

/// Map worker: pulls splits from the shared task queue and feeds records to
/// its paired spill worker
///
/// The worker stops when the task queue is closed and drained, or when the
/// shutdown signal is raised. Dropping the worker's output sender is what
/// tells the spill worker that no more records will arrive.
pub struct MapWorker<M, SD> {
    id: usize,
    mapper: Arc<M>,
    tasks: Receiver<Split>,
    output: Sender<Record>,
    shutdown: SD,
}

impl<M, SD> MapWorker<M, SD>
where
    M: Mapper,
    SD: ShutdownSignal,
{
    pub fn new(
        id: usize,
        mapper: Arc<M>,
        tasks: Receiver<Split>,
        output: Sender<Record>,
        shutdown: SD,
    ) -> Self {
        Self {
            id,
            mapper,
            tasks,
            output,
            shutdown,
        }
    }

    pub fn run(self) -> Result<MapWorkerStats> {
        let mut stats = MapWorkerStats::default();

        loop {
            if self.shutdown.is_cancelled() {
                info!(worker = self.id, "map worker cancelled");
                return Err(JobError::Cancelled);
            }

            let Ok(split) = self.tasks.recv() else {
                break;
            };

            self.process_split(&split, &mut stats)?;
            stats.splits += 1;
        }

        debug!(
            worker = self.id,
            splits = stats.splits,
            records = stats.records,
            "map worker drained task queue"
        );
        Ok(stats)
    }

    fn process_split(&self, split: &Split, stats: &mut MapWorkerStats) -> Result<()> {
        let file = File::open(&split.path).map_err(JobError::io_at("open split", &split.path))?;
        let mut reader = BufReader::new(file);

        let mut disconnected = false;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| JobError::io("read split", &split.path, e))?;
            if read == 0 {
                break;
            }
            // invalid UTF-8 becomes U+FFFD instead of failing the split
            let line = String::from_utf8_lossy(&buf);

            for token in line.split_whitespace() {
                stats.tokens += 1;
                self.mapper.map(token, &mut |record| {
                    if disconnected {
                        return;
                    }
                    if self.output.send(record).is_err() {
                        disconnected = true;
                    } else {
                        stats.records += 1;
                    }
                });
                if disconnected {
                    return Err(JobError::Disconnected {
                        role: "map",
                        id: self.id,
                    });
                }
            }
        }

        debug!(
            worker = self.id,
            split = %split.path.display(),
            lines = split.lines,
            "mapped split"
        );
        Ok(())
    }
}
