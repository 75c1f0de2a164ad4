//! Family-wide filter properties.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::hash::HashFn;

fn family(log_dir: &std::path::Path) -> Vec<Filter> {
    vec![
        Filter::Bitset(BitsetFilter::new(64, HashFn::shift_mask(2, 0x3F)).unwrap()),
        Filter::Bitset(BitsetFilter::new(256, HashFn::knuth(2, 0xFF)).unwrap()),
        Filter::Array(ArrayBitsetFilter::new(32, 16, HashFn::shift_mask(2, 0x1FF)).unwrap()),
        Filter::Banked(BankedFilter::new(2, 32, 16).unwrap()),
        Filter::Range(RangeFilter::new()),
        Filter::Hybrid(HybridRangeBankedFilter::new(
            BankedFilter::new(2, 32, 32).unwrap(),
        )),
        Filter::Exact(ExactSetFilter::new()),
        Filter::GlobalTable(GlobalHashTableFilter::new()),
        Filter::Logging(LoggingDecoratorFilter::with_log_dir(
            Box::new(Filter::Banked(BankedFilter::new(2, 32, 16).unwrap())),
            42,
            log_dir,
        )),
    ]
}

#[test]
fn no_variant_ever_reports_a_false_negative() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    for mut filter in family(dir.path()) {
        let name = filter.name();
        let addrs: Vec<u64> = (0..200).map(|_| rng.random_range(0..0x10_0000u64)).collect();
        for &a in &addrs {
            filter.insert(a);
        }
        for &a in &addrs {
            assert!(filter.check(a), "{name} dropped inserted address {a:#x}");
        }
    }
}

#[test]
fn population_is_monotone_under_insertion() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0xBEEF);
    for mut filter in family(dir.path()) {
        let name = filter.name();
        let mut last = filter.population();
        for _ in 0..100 {
            filter.insert(rng.random_range(0..0x10_0000u64));
            let pop = filter.population();
            assert!(pop >= last, "{name} population shrank: {last} -> {pop}");
            last = pop;
        }
    }
}

#[test]
fn only_heap_backed_kinds_demand_freeing() {
    let dir = tempfile::tempdir().unwrap();
    for filter in family(dir.path()) {
        let expected = matches!(
            filter.kind(),
            FilterKind::ExactSet | FilterKind::LoggingDecorator
        );
        assert_eq!(filter.needs_free(), expected, "{}", filter.name());
    }
}

#[test]
fn clones_are_independent() {
    let mut a = Filter::Banked(BankedFilter::new(2, 32, 16).unwrap());
    let b = a.clone();
    a.insert(0x1234);
    assert!(a.check(0x1234));
    assert!(!b.check(0x1234));
}
