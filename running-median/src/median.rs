// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::BTreeMap;
use std::fmt;

/// Median of the values observed so far
///
/// Displayed as the plain value, or as the mean of the two middle values with
/// one decimal when the count is even and the middle falls between buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Median {
    Exact(usize),
    Between(usize, usize),
}

impl Median {
    pub fn value(&self) -> f64 {
        match *self {
            Median::Exact(v) => v as f64,
            Median::Between(low, high) => (low + high) as f64 / 2.0,
        }
    }
}

impl fmt::Display for Median {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Median::Exact(v) => write!(f, "{v}"),
            Median::Between(..) => write!(f, "{:.1}", self.value()),
        }
    }
}

/// Streaming median over small non-negative integers, kept as a histogram
#[derive(Debug, Default, Clone)]
pub struct RunningMedian {
    histogram: BTreeMap<usize, u64>,
    count: u64,
}

impl RunningMedian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` and returns the median including it
    pub fn push(&mut self, value: usize) -> Median {
        *self.histogram.entry(value).or_insert(0) += 1;
        self.count += 1;
        match self.median() {
            Some(median) => median,
            None => Median::Exact(value),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn median(&self) -> Option<Median> {
        let target = (self.count + 1) / 2;
        let mut seen = 0;
        let mut buckets = self.histogram.iter().peekable();

        while let Some((&value, &count)) = buckets.next() {
            seen += count;
            if seen == target && self.count % 2 == 0 {
                return Some(match buckets.peek() {
                    Some((&next, _)) => Median::Between(value, next),
                    None => Median::Exact(value),
                });
            }
            if seen >= target {
                return Some(Median::Exact(value));
            }
        }
        None
    }
}

/// Number of whitespace-separated words on a line
pub fn words_per_line(line: &str) -> usize {
    line.split_whitespace().count()
}
