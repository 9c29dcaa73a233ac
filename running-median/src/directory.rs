// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::MedianError;
use crate::median::{words_per_line, RunningMedian};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Regular files directly inside `dir`, in alphabetical order
fn input_files(dir: &Path) -> Result<Vec<PathBuf>, MedianError> {
    let entries =
        fs::read_dir(dir).map_err(|e| MedianError::io("read input directory", dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| MedianError::io("read input directory", dir, e))?
            .path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Writes one running median per input line to `writer`
///
/// Returns the number of lines read. Lines are split on `\n` as raw bytes
/// and invalid UTF-8 is decoded lossily.
pub fn write_running_medians<R, W>(
    mut reader: R,
    median: &mut RunningMedian,
    writer: &mut W,
) -> std::io::Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut lines = 0;
    let mut buf = Vec::new();
    while reader.read_until(b'\n', &mut buf)? > 0 {
        let current = median.push(words_per_line(&String::from_utf8_lossy(&buf)));
        writeln!(writer, "{current}")?;
        lines += 1;
        buf.clear();
    }
    Ok(lines)
}

/// Computes the running median of words per line over every file of
/// `input_dir`, read as one stream in alphabetical file order
///
/// Returns the number of lines processed.
pub fn running_median_dir(
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<u64, MedianError> {
    let input_dir = input_dir.as_ref();
    let output_path = output_path.as_ref();

    let files = input_files(input_dir)?;
    if files.is_empty() {
        return Err(MedianError::NoInput(input_dir.to_path_buf()));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| MedianError::io("create output directory", parent, e))?;
        }
    }
    let output = File::create(output_path)
        .map_err(|e| MedianError::io("create output file", output_path, e))?;
    let mut writer = BufWriter::new(output);

    let mut median = RunningMedian::new();
    let mut total = 0;
    for file in &files {
        let reader = BufReader::new(
            File::open(file).map_err(|e| MedianError::io("open input file", file, e))?,
        );
        // read and write errors are both reported against the input file
        let lines = write_running_medians(reader, &mut median, &mut writer)
            .map_err(|e| MedianError::io("compute running median", file, e))?;
        debug!(file = %file.display(), lines, "processed file");
        total += lines;
    }

    writer
        .flush()
        .map_err(|e| MedianError::io("write output file", output_path, e))?;

    info!(
        files = files.len(),
        lines = total,
        output = %output_path.display(),
        "running median finished"
    );
    Ok(total)
}
