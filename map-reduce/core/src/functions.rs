// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::record::Record;

/// User map function, invoked once per whitespace-delimited token
pub trait Mapper: Send + Sync + 'static {
    fn map<E>(&self, token: &str, emit: &mut E)
    where
        E: FnMut(Record);
}

impl<F> Mapper for F
where
    F: Fn(&str) -> Record + Send + Sync + 'static,
{
    fn map<E>(&self, token: &str, emit: &mut E)
    where
        E: FnMut(Record),
    {
        emit((self)(token))
    }
}

/// User reduce function, invoked once per distinct key with all its values
pub trait Reducer: Send + Sync + 'static {
    fn reduce(&self, key: &str, values: &[i64]) -> Record;
}

impl<F> Reducer for F
where
    F: Fn(&str, &[i64]) -> i64 + Send + Sync + 'static,
{
    fn reduce(&self, key: &str, values: &[i64]) -> Record {
        Record::new(key, (self)(key, values))
    }
}

/// Pre-aggregation applied by spill workers before each flush
///
/// The result must be compatible with the job's reducer: reducing the
/// combined values gives the same answer as reducing the raw ones.
pub trait Combiner: Send + Sync {
    fn combine(&self, key: &str, values: &[i64]) -> i64;
}

impl<R: Reducer> Combiner for R {
    fn combine(&self, key: &str, values: &[i64]) -> i64 {
        self.reduce(key, values).value
    }
}
