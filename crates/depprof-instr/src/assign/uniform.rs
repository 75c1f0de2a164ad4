//! Arrival-order bucketing with a producer cap.

use std::collections::HashMap;

use depprof_core::{InstrRef, PsetId, QuerySet};

/// Buckets queries by arrival order, capped at `max_set_size` distinct
/// producers per set.
///
/// A producer, once assigned, always reuses its set; the cap counts
/// producers, not queries. A cap of -1 puts the whole region in one set
/// (cheapest); a cap of 1 gives every producer its own set (the precise
/// extreme used by the exact-oracle mode).
#[derive(Debug)]
pub struct UniformAssign {
    max_set_size: i32,
    by_producer: HashMap<InstrRef, PsetId>,
}

impl UniformAssign {
    pub fn new(max_set_size: i32) -> Self {
        UniformAssign {
            max_set_size,
            by_producer: HashMap::new(),
        }
    }

    pub fn max_set_size(&self) -> i32 {
        self.max_set_size
    }
}

impl super::SetAssigner for UniformAssign {
    fn assign(&mut self, queries: &mut QuerySet) -> u64 {
        let mut current: PsetId = 0;
        let mut count = 0i32;
        let mut created: u64 = u64::from(!queries.is_empty());

        for q in queries.iter_mut() {
            match self.by_producer.get(&q.producer) {
                Some(&pset) => {
                    // Same producer as an earlier query: reuse its set.
                    q.pset = pset;
                }
                None => {
                    if self.max_set_size != -1 {
                        if count >= self.max_set_size {
                            count = 1;
                            current += 1;
                            created += 1;
                        } else {
                            count += 1;
                        }
                    }
                    q.pset = current;
                    self.by_producer.insert(q.producer, current);
                }
            }
        }
        created
    }
}
