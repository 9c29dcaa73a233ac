// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Running median of the number of words per line.

mod error;
pub use error::MedianError;

pub mod median;
pub use median::{words_per_line, Median, RunningMedian};

mod directory;
pub use directory::{running_median_dir, write_running_medians};
