//! Query types describing candidate dependence pairs.
//!
//! A query names a producer (writing) instruction and a consumer (reading)
//! instruction that static analysis could not disambiguate. The profiler
//! answers, per execution, whether the two ever touched overlapping memory.

use std::fmt;

/// Opaque reference to an instruction in the client's program representation.
///
/// The core never interprets the underlying instruction; references are only
/// compared for identity and used as positions in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrRef(pub u32);

impl fmt::Display for InstrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Profile set key: a group of queries sharing one filter instance.
pub type PsetId = u64;

/// A candidate dependence pair to resolve at run time.
#[derive(Debug, Clone)]
pub struct Query {
    /// Unique reference id, stable across runs (feeds the persistence layer).
    pub id: u64,
    /// The writing instruction.
    pub producer: InstrRef,
    /// The reading instruction.
    pub consumer: InstrRef,
    /// Profile set assigned by the planner. Zero until planned.
    pub pset: PsetId,
    /// Set by the scheduler when an earlier query already covers this
    /// (consumer, pset) pair; repeated queries share that query's accumulator.
    pub repeated: bool,
    /// Total executions observed in a prior profiling run, if any.
    pub total: u32,
}

impl Query {
    /// Creates an unplanned query.
    pub fn new(id: u64, producer: InstrRef, consumer: InstrRef) -> Self {
        Query {
            id,
            producer,
            consumer,
            pset: 0,
            repeated: false,
            total: 0,
        }
    }

    /// Creates a query with a pre-assigned profile set.
    pub fn with_pset(id: u64, producer: InstrRef, consumer: InstrRef, pset: PsetId) -> Self {
        Query {
            pset,
            ..Query::new(id, producer, consumer)
        }
    }
}

/// Ordered collection of queries.
///
/// Arrival order is contractual: the planner buckets by it and the scheduler
/// processes queries in it.
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    pub fn new() -> Self {
        QuerySet::default()
    }

    pub fn push(&mut self, query: Query) {
        self.queries.push(query);
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Query> {
        self.queries.iter_mut()
    }

    pub fn as_slice(&self) -> &[Query] {
        &self.queries
    }

    pub fn into_vec(self) -> Vec<Query> {
        self.queries
    }
}

impl FromIterator<Query> for QuerySet {
    fn from_iter<I: IntoIterator<Item = Query>>(iter: I) -> Self {
        QuerySet {
            queries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a Query;
    type IntoIter = std::slice::Iter<'a, Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_query_is_unplanned() {
        let q = Query::new(7, InstrRef(1), InstrRef(2));
        assert_eq!(q.pset, 0);
        assert!(!q.repeated);
        assert_eq!(q.total, 0);
    }

    #[test]
    fn query_set_preserves_arrival_order() {
        let mut qs = QuerySet::new();
        for id in 0..5 {
            qs.push(Query::new(id, InstrRef(id as u32), InstrRef(100)));
        }
        let ids: Vec<u64> = qs.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
