// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{JobError, Result};
use std::thread::{self, JoinHandle};

/// Handle to a worker running on its own OS thread
pub struct WorkerHandle<T> {
    role: &'static str,
    id: usize,
    handle: JoinHandle<Result<T>>,
}

/// Spawn a named worker thread
pub fn spawn_worker<T, F>(role: &'static str, id: usize, f: F) -> Result<WorkerHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(format!("{role}-worker-{id}"))
        .spawn(f)
        .map_err(|source| JobError::Io {
            operation: "spawn worker thread",
            path: format!("{role}-worker-{id}").into(),
            source,
        })?;

    Ok(WorkerHandle { role, id, handle })
}

impl<T> WorkerHandle<T> {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to complete
    pub fn join(self) -> Result<T> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(JobError::WorkerPanicked {
                role: self.role,
                id: self.id,
            }),
        }
    }
}
