//! Process-wide shared hash table filter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::hash::KNUTH_MULT;

/// Default table size in bytes, matching the runtime's default.
pub const DEFAULT_TABLE_BYTES: u32 = 50_000;

static TABLE: OnceLock<GlobalTable> = OnceLock::new();

struct GlobalTable {
    words: Box<[AtomicU64]>,
    bits: u64,
}

impl GlobalTable {
    fn with_bytes(table_bytes: u32) -> Self {
        let bits = u64::from(table_bytes.max(8)) * 8;
        let words = (0..bits.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        GlobalTable { words, bits }
    }

    fn index(&self, addr: u64) -> (usize, u64) {
        let hash = (addr >> 2).wrapping_mul(u64::from(KNUTH_MULT));
        let idx = hash % self.bits;
        ((idx / 64) as usize, 1u64 << (idx % 64))
    }
}

/// Sizes the process-wide table. Idempotent: only the first call allocates;
/// later calls (and any size they carry) are ignored. Returns whether this
/// call performed the allocation.
pub fn init_global_table(table_bytes: u32) -> bool {
    let mut allocated = false;
    TABLE.get_or_init(|| {
        allocated = true;
        GlobalTable::with_bytes(table_bytes)
    });
    allocated
}

fn table() -> &'static GlobalTable {
    TABLE.get_or_init(|| GlobalTable::with_bytes(DEFAULT_TABLE_BYTES))
}

/// A view onto the one process-wide bit table.
///
/// All instances, across all profile sets, share the same table: a check may
/// observe bits inserted on behalf of an unrelated set, so cross-set false
/// positives are possible. That sharing is the point: the table survives
/// region exits and costs nothing per activation.
///
/// Writers are not coordinated beyond word-level atomicity. Concurrent
/// activations interleave their bits arbitrarily, which only ever adds false
/// positives, never false negatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalHashTableFilter;

impl GlobalHashTableFilter {
    pub fn new() -> Self {
        GlobalHashTableFilter
    }

    pub fn insert(&mut self, addr: u64) {
        let t = table();
        let (word, bit) = t.index(addr);
        t.words[word].fetch_or(bit, Ordering::Relaxed);
    }

    pub fn check(&self, addr: u64) -> bool {
        let t = table();
        let (word, bit) = t.index(addr);
        t.words[word].load(Ordering::Relaxed) & bit != 0
    }
}
