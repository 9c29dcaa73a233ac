// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedianError {
    #[error("input directory '{}' contains no files", .0.display())]
    NoInput(PathBuf),

    #[error("{operation} '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MedianError {
    pub(crate) fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        MedianError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}
