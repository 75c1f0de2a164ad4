//! Banked filter: independent array banks ANDed together.

use depprof_core::{DepProfError, Result};
use smallvec::SmallVec;

use crate::filter::ArrayBitsetFilter;
use crate::hash::HashFn;

/// N independent [`ArrayBitsetFilter`] banks, each with its own hash.
///
/// Insert broadcasts to every bank; check is the logical AND across banks,
/// so an address reads as present only when every bank agrees. More banks
/// lower the false-positive rate at the price of more work per operation.
/// This is the central precision/cost lever of the family.
#[derive(Debug, Clone)]
pub struct BankedFilter {
    banks: SmallVec<[ArrayBitsetFilter; 4]>,
}

impl BankedFilter {
    /// Creates `n_banks` equally sized banks with staggered XOR-fold hashes:
    /// each bank consumes a different slice of the folded address, starting
    /// two bits in and advancing by the bank's index width.
    pub fn new(n_banks: u32, element_bits: u32, length: u32) -> Result<Self> {
        let level = index_bits(element_bits, length)?;
        let mask = (1u32 << level) - 1;
        let mut offset = 2;
        let mut banks = SmallVec::new();
        for _ in 0..n_banks {
            banks.push(ArrayBitsetFilter::new(
                element_bits,
                length,
                HashFn::xor_fold(offset, mask),
            )?);
            offset += level;
        }
        Self::from_banks(banks)
    }

    /// Creates banks of the given lengths, one hash per bank.
    ///
    /// # Errors
    ///
    /// The hash count must match the bank count; banks must be nonzero in
    /// number and length.
    pub fn with_banks(element_bits: u32, lengths: &[u32], hashes: &[HashFn]) -> Result<Self> {
        if lengths.len() != hashes.len() {
            return Err(DepProfError::InvalidFilterConfig(format!(
                "banked filter needs one hash per bank: {} banks, {} hashes",
                lengths.len(),
                hashes.len()
            )));
        }
        let mut banks = SmallVec::new();
        for (&len, &hash) in lengths.iter().zip(hashes) {
            banks.push(ArrayBitsetFilter::new(element_bits, len, hash)?);
        }
        Self::from_banks(banks)
    }

    fn from_banks(banks: SmallVec<[ArrayBitsetFilter; 4]>) -> Result<Self> {
        if banks.is_empty() {
            return Err(DepProfError::InvalidFilterConfig(
                "banked filter needs at least one bank".to_string(),
            ));
        }
        // Population counting is part of the banked contract and is only
        // defined over 32-bit elements; reject other widths outright rather
        // than degrade to a partial filter.
        if let Some(bank) = banks.iter().find(|b| b.element_bits() != 32) {
            return Err(DepProfError::InvalidFilterConfig(format!(
                "banked filter population requires 32-bit elements, got {}",
                bank.element_bits()
            )));
        }
        Ok(BankedFilter { banks })
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    pub fn banks(&self) -> &[ArrayBitsetFilter] {
        &self.banks
    }

    /// Total element count across banks.
    pub fn total_len(&self) -> u32 {
        self.banks.iter().map(|b| b.word_len()).sum()
    }

    pub fn insert(&mut self, addr: u64) {
        for bank in &mut self.banks {
            bank.insert(addr);
        }
    }

    pub fn check(&self, addr: u64) -> bool {
        self.banks.iter().all(|b| b.check(addr))
    }

    pub fn clear(&mut self) {
        for bank in &mut self.banks {
            bank.clear();
        }
    }

    /// Total set bits across all banks.
    pub fn population(&self) -> u32 {
        self.banks.iter().map(|b| b.count_ones()).sum()
    }

    pub fn name(&self) -> String {
        // Named after the first bank; mixed-length banks exist only in the
        // struct-aware configuration.
        let bits = self.banks[0].total_bits();
        format!("banked_{}x{}", self.banks.len(), bits)
    }
}

/// Floor log2 of the bank's bit capacity: the number of index bits one bank
/// consumes.
fn index_bits(element_bits: u32, length: u32) -> Result<u32> {
    let total = element_bits.checked_mul(length).unwrap_or(0);
    if total == 0 {
        return Err(DepProfError::InvalidFilterConfig(
            "banked filter bank capacity must be nonzero".to_string(),
        ));
    }
    Ok(31 - total.leading_zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_banks() {
        assert!(BankedFilter::new(0, 32, 16).is_err());
        assert!(BankedFilter::with_banks(32, &[], &[]).is_err());
    }

    #[test]
    fn rejects_hash_count_mismatch() {
        let hashes = [HashFn::xor_fold(2, 0x1FF)];
        assert!(BankedFilter::with_banks(32, &[16, 16], &hashes).is_err());
    }

    #[test]
    fn rejects_non_32_bit_elements() {
        // Population is only defined over 32-bit elements, so other widths
        // are a configuration error, not a silent skip.
        assert!(BankedFilter::new(2, 64, 16).is_err());
        let hashes = [HashFn::xor_fold(2, 0x1FF)];
        assert!(BankedFilter::with_banks(16, &[16], &hashes).is_err());
    }

    #[test]
    fn rejects_zero_length_bank() {
        let hashes = [HashFn::xor_fold(2, 0x1FF), HashFn::xor_fold(11, 0x1FF)];
        assert!(BankedFilter::with_banks(32, &[16, 0], &hashes).is_err());
    }

    #[test]
    fn insert_broadcasts_to_every_bank() {
        let mut f = BankedFilter::new(2, 32, 16).unwrap();
        f.insert(0x1000);
        for bank in f.banks() {
            assert!(bank.check(0x1000));
        }
    }

    #[test]
    fn check_is_the_and_of_banks() {
        let mut f = BankedFilter::new(3, 32, 16).unwrap();
        let addrs = [0x1000u64, 0x2040, 0x40F0];
        for &a in &addrs {
            f.insert(a);
        }
        for &a in &addrs {
            assert!(f.check(a));
        }
        // An address present in no bank is definitely absent.
        assert!(!BankedFilter::new(3, 32, 16).unwrap().check(0x1000));
    }

    #[test]
    fn population_counts_bits_across_banks() {
        let mut f = BankedFilter::new(2, 32, 16).unwrap();
        assert_eq!(f.population(), 0);
        f.insert(0x1000);
        // One bit per bank, unless both banks map to the same index value.
        assert!(f.population() >= 1 && f.population() <= 2);
    }
}
