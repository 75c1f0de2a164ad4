//! Consumer-sharing assignment via union-find.

use std::collections::HashMap;

use depprof_core::{InstrRef, PsetId, QuerySet};

/// Starts every producer in its own set, then merges sets until all queries
/// sharing a consumer end up in the same pset.
///
/// The contractual postcondition is the transitive closure: if q1 and q2
/// share a consumer, they share a pset, however many merge steps that takes.
/// Union-find gets there directly instead of the quadratic re-walk the
/// postcondition would otherwise need.
#[derive(Debug, Default)]
pub struct LinearAssign {
    parent: Vec<usize>,
}

impl LinearAssign {
    pub fn new() -> Self {
        LinearAssign::default()
    }

    fn make_node(&mut self) -> usize {
        let node = self.parent.len();
        self.parent.push(node);
        node
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            // Path halving.
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

impl super::SetAssigner for LinearAssign {
    fn assign(&mut self, queries: &mut QuerySet) -> u64 {
        let mut producer_node: HashMap<InstrRef, usize> = HashMap::new();
        let mut consumer_node: HashMap<InstrRef, usize> = HashMap::new();

        // Optimistically give every producer a set of its own, then merge the
        // sets of producers that feed the same consumer.
        for q in queries.iter() {
            let node = match producer_node.get(&q.producer) {
                Some(&n) => n,
                None => {
                    let n = self.make_node();
                    producer_node.insert(q.producer, n);
                    n
                }
            };
            match consumer_node.get(&q.consumer) {
                Some(&other) => self.union(other, node),
                None => {
                    consumer_node.insert(q.consumer, node);
                }
            }
        }

        // Number the merged roots in first-seen order; psets start at 1 the
        // way the original numbering did.
        let mut root_pset: HashMap<usize, PsetId> = HashMap::new();
        let mut next: PsetId = 1;
        for q in queries.iter_mut() {
            let root = self.find(producer_node[&q.producer]);
            let pset = *root_pset.entry(root).or_insert_with(|| {
                let p = next;
                next += 1;
                p
            });
            q.pset = pset;
        }
        next - 1
    }
}
