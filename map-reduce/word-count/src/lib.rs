// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::{Job, JobConfig, Mapper, Record, Reducer};

/// Strips leading and trailing ASCII punctuation and lowercases the rest
///
/// A token made only of punctuation is returned unchanged.
pub fn normalize_token(token: &str) -> String {
    let trimmed = token.trim_matches(|c: char| c.is_ascii_punctuation());
    if trimmed.is_empty() {
        token.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Emits `(normalized word, 1)` for every token
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountMapper;

impl Mapper for WordCountMapper {
    fn map<E>(&self, token: &str, emit: &mut E)
    where
        E: FnMut(Record),
    {
        emit(Record::new(normalize_token(token), 1));
    }
}

/// Sums the values of a key; also used as the combiner
#[derive(Debug, Clone, Copy, Default)]
pub struct SumReducer;

impl Reducer for SumReducer {
    fn reduce(&self, key: &str, values: &[i64]) -> Record {
        Record::new(key, values.iter().sum())
    }
}

/// Word-count job over `config`, pre-aggregating spills when `combine` is set
pub fn word_count_job(config: JobConfig, combine: bool) -> Job<WordCountMapper, SumReducer> {
    let job = Job::new(config, WordCountMapper, SumReducer);
    if combine {
        job.with_combiner(SumReducer)
    } else {
        job
    }
}
