// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{JobError, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One chunk of an input file, the unit of work of a map worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub path: PathBuf,
    pub source: PathBuf,
    /// 1-based position of the chunk within its source file
    pub index: usize,
    pub lines: usize,
}

/// Regular files directly inside `dir`, sorted by name
pub fn list_input_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(JobError::io_at("read input directory", dir))? {
        let entry = entry.map_err(JobError::io_at("read input directory", dir))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Cuts input files into split files of at most `lines_per_split` lines
pub struct InputSplitter {
    split_dir: PathBuf,
    lines_per_split: usize,
}

impl InputSplitter {
    pub fn new(split_dir: impl Into<PathBuf>, lines_per_split: usize) -> Self {
        Self {
            split_dir: split_dir.into(),
            lines_per_split: lines_per_split.max(1),
        }
    }

    /// Splits every regular file of `input_dir`
    ///
    /// Fails with [`JobError::NoInput`] before creating anything when the
    /// directory has no files.
    pub fn split_dir(&self, input_dir: impl AsRef<Path>) -> Result<Vec<Split>> {
        let input_dir = input_dir.as_ref();
        let files = list_input_files(input_dir)?;
        if files.is_empty() {
            return Err(JobError::NoInput(input_dir.to_path_buf()));
        }
        self.split_files(&files)
    }

    pub fn split_files(&self, files: &[PathBuf]) -> Result<Vec<Split>> {
        fs::create_dir_all(&self.split_dir)
            .map_err(JobError::io_at("create split directory", &self.split_dir))?;

        let mut splits = Vec::new();
        for file in files {
            splits.extend(self.split_file(file)?);
        }
        Ok(splits)
    }

    fn split_file(&self, source: &Path) -> Result<Vec<Split>> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        let mut reader = BufReader::new(
            File::open(source).map_err(JobError::io_at("open input file", source))?,
        );

        let mut splits = Vec::new();
        let mut current: Option<(BufWriter<File>, Split)> = None;
        // raw bytes: the input encoding is only interpreted by the map workers
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| JobError::io("read input file", source, e))?;
            if read == 0 {
                break;
            }
            if !line.ends_with(b"\n") {
                line.push(b'\n');
            }

            let (mut writer, mut split) = match current.take() {
                Some(open) => open,
                None => self.open_split(source, &name, splits.len() + 1)?,
            };

            writer
                .write_all(&line)
                .map_err(|e| JobError::io("write split", &split.path, e))?;
            split.lines += 1;

            if split.lines == self.lines_per_split {
                splits.push(finish_split(writer, split)?);
            } else {
                current = Some((writer, split));
            }
        }

        if let Some((writer, split)) = current.take() {
            splits.push(finish_split(writer, split)?);
        }

        debug!(source = %source.display(), splits = splits.len(), "split input file");
        Ok(splits)
    }

    fn open_split(
        &self,
        source: &Path,
        name: &str,
        index: usize,
    ) -> Result<(BufWriter<File>, Split)> {
        let path = self.split_dir.join(format!("{name}_split_{index}"));
        let file = File::create(&path).map_err(JobError::io_at("create split", &path))?;
        let split = Split {
            path,
            source: source.to_path_buf(),
            index,
            lines: 0,
        };
        Ok((BufWriter::new(file), split))
    }
}

fn finish_split(mut writer: BufWriter<File>, split: Split) -> Result<Split> {
    writer
        .flush()
        .map_err(JobError::io_at("write split", &split.path))?;
    Ok(split)
}
