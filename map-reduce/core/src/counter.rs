// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Monotonic id generator shared by all spill workers of a job
#[derive(Clone, Debug, Default)]
pub struct SharedCounter {
    value: Arc<AtomicU64>,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(value: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(value)),
        }
    }

    /// Returns the current value and increments it
    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}
