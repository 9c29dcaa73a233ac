// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that abort a map-reduce job
#[derive(Debug, Error)]
pub enum JobError {
    /// The input directory holds no regular files
    #[error("input directory '{}' contains no files", .0.display())]
    NoInput(PathBuf),

    /// A configuration value is out of range or inconsistent
    #[error("invalid job configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be parsed
    #[error("failed to parse configuration '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Disk I/O failed while splitting, spilling or merging
    #[error("{operation} '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker could not hand its output downstream because the peer is gone
    #[error("{role} worker {id} lost its downstream channel")]
    Disconnected { role: &'static str, id: usize },

    /// A worker thread panicked
    #[error("{role} worker {id} panicked")]
    WorkerPanicked { role: &'static str, id: usize },

    /// The shutdown signal was raised before the job finished
    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        JobError::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Builds a `map_err` adapter that attaches the operation and path
    pub fn io_at(
        operation: &'static str,
        path: impl AsRef<Path>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| JobError::Io {
            operation,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
