//! Range-gated banked filter.

use crate::filter::{BankedFilter, RangeFilter};

/// A [`RangeFilter`] and a [`BankedFilter`] updated together.
///
/// Check evaluates the range first and performs the banked check only when
/// the range says "maybe". The result is bit-identical to
/// `range.check(x) && banked.check(x)` for every history: when the range
/// rejects, the AND is false regardless of the banked answer, so eliding the
/// banked work is pure control flow.
#[derive(Debug, Clone)]
pub struct HybridRangeBankedFilter {
    range: RangeFilter,
    banked: BankedFilter,
}

impl HybridRangeBankedFilter {
    pub fn new(banked: BankedFilter) -> Self {
        HybridRangeBankedFilter {
            range: RangeFilter::new(),
            banked,
        }
    }

    pub fn insert(&mut self, addr: u64) {
        self.range.insert(addr);
        self.banked.insert(addr);
    }

    pub fn check(&self, addr: u64) -> bool {
        self.range.check(addr) && self.banked.check(addr)
    }

    pub fn range(&self) -> &RangeFilter {
        &self.range
    }

    pub fn banked(&self) -> &BankedFilter {
        &self.banked
    }

    pub fn clear(&mut self) {
        self.range.clear();
        self.banked.clear();
    }

    pub fn population(&self) -> u32 {
        self.banked.population()
    }

    pub fn name(&self) -> String {
        format!("hybrid_range_{}", self.banked.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hybrid() -> HybridRangeBankedFilter {
        HybridRangeBankedFilter::new(BankedFilter::new(2, 32, 16).unwrap())
    }

    #[test]
    fn inserted_addresses_are_found() {
        let mut f = hybrid();
        for addr in [0x1000u64, 0x1400, 0x2000] {
            f.insert(addr);
            assert!(f.check(addr));
        }
    }

    #[test]
    fn range_rejects_before_the_banks_run() {
        let mut f = hybrid();
        f.insert(0x1000);
        f.insert(0x2000);
        // Outside the observed range: definitely absent, whatever the banks say.
        assert!(!f.check(0x0100));
        assert!(!f.check(0xFFFF_0000));
    }

    #[test]
    fn check_equals_range_and_banked() {
        let mut f = hybrid();
        let mut range = RangeFilter::new();
        let mut banked = BankedFilter::new(2, 32, 16).unwrap();
        let inserts = [0x1000u64, 0x1F40, 0x3008, 0x2A2C];
        for &a in &inserts {
            f.insert(a);
            range.insert(a);
            banked.insert(a);
        }
        for probe in (0u64..0x5000).step_by(4) {
            assert_eq!(
                f.check(probe),
                range.check(probe) && banked.check(probe),
                "hybrid diverged from range AND banked at {probe:#x}"
            );
        }
    }
}
