//! Deterministic filter factories.
//!
//! Each function maps a requested bit budget (and optional struct-size hint)
//! to a tuned concrete configuration along a fixed size ladder. Factories are
//! pure: the same parameters always yield the same configuration, which the
//! scheduler relies on when it clones one template per activation.

use depprof_core::{DepProfError, Result};

use crate::filter::{
    ArrayBitsetFilter, BankedFilter, BitsetFilter, ExactSetFilter, Filter, GlobalHashTableFilter,
    HybridRangeBankedFilter, RangeFilter,
};
use crate::hash::{HashFn, PreOp};

/// Smallest struct size worth a struct-aware configuration.
pub const MIN_STRUCT_SIZE: u32 = 16;

/// Cheapest adequate filter for the bit budget, shift-mask hashing.
pub fn create_fast(bits: u32) -> Result<Filter> {
    let f = if bits <= 32 {
        Filter::Bitset(BitsetFilter::new(32, HashFn::shift_mask(2, 0x1F))?)
    } else if bits <= 64 {
        Filter::Bitset(BitsetFilter::new(64, HashFn::shift_mask(2, 0x3F))?)
    } else if bits <= 128 {
        Filter::Bitset(BitsetFilter::new(128, HashFn::shift_mask(2, 0x7F))?)
    } else if bits <= 256 {
        Filter::Bitset(BitsetFilter::new(256, HashFn::shift_mask(2, 0xFF))?)
    } else if bits <= 512 {
        Filter::Array(ArrayBitsetFilter::new(32, 16, HashFn::shift_mask(2, 0x1FF))?)
    } else if bits <= 1024 {
        Filter::Banked(BankedFilter::new(2, 32, 16)?)
    } else if bits <= 2048 {
        Filter::Array(ArrayBitsetFilter::new(32, 64, HashFn::shift_mask(2, 0x7FF))?)
    } else {
        // Really big request; a flat array keeps the per-operation cost down.
        Filter::Array(ArrayBitsetFilter::new(
            32,
            128,
            HashFn::shift_mask(2, 0xFFF),
        )?)
    };
    Ok(f)
}

/// Same ladder with multiplicative hashing, and banked (not flat array)
/// configurations above 512 bits.
pub fn create_accurate(bits: u32) -> Result<Filter> {
    let f = if bits <= 32 {
        Filter::Bitset(BitsetFilter::new(32, HashFn::knuth(2, 0x1F))?)
    } else if bits <= 64 {
        Filter::Bitset(BitsetFilter::new(64, HashFn::knuth(2, 0x3F))?)
    } else if bits <= 128 {
        Filter::Bitset(BitsetFilter::new(128, HashFn::knuth(2, 0x7F))?)
    } else if bits <= 256 {
        Filter::Bitset(BitsetFilter::new(256, HashFn::knuth(2, 0xFF))?)
    } else if bits <= 512 {
        Filter::Array(ArrayBitsetFilter::new(32, 16, HashFn::knuth(2, 0x1FF))?)
    } else {
        let (banks, len) = banked_ladder(bits);
        Filter::Banked(BankedFilter::new(banks, 32, len)?)
    };
    Ok(f)
}

/// The accurate banked ladder wrapped in a range gate.
pub fn create_hybrid(bits: u32) -> Result<Filter> {
    if bits <= 512 {
        return Err(DepProfError::InvalidFilterConfig(format!(
            "hybrid filter needs a banked configuration; request more than 512 bits, got {bits}"
        )));
    }
    let (banks, len) = banked_ladder(bits);
    Ok(Filter::Hybrid(HybridRangeBankedFilter::new(
        BankedFilter::new(banks, 32, len)?,
    )))
}

/// Banked filter whose hashes first divide addresses by `struct_size`,
/// colocating same-field accesses across struct instances, plus one extra
/// small bank over the struct-relative offset.
pub fn create_struct_aware(bits: u32, struct_size: u32) -> Result<Filter> {
    if bits <= 512 {
        return Err(DepProfError::InvalidFilterConfig(format!(
            "struct-aware filter needs a banked configuration; request more than 512 bits, got {bits}"
        )));
    }
    if struct_size < MIN_STRUCT_SIZE {
        return Err(DepProfError::InvalidFilterConfig(format!(
            "struct-aware filter needs a struct of at least {MIN_STRUCT_SIZE} bytes, got {struct_size}"
        )));
    }
    if struct_size > 256 * 1024 {
        tracing::warn!(
            struct_size,
            "struct sizes above 256K exceed what the offset hash distinguishes"
        );
    }

    let (banks, len) = banked_ladder(bits);
    let level = 31 - (32 * len).leading_zeros();
    let mask = (1u32 << level) - 1;

    let mut lengths = Vec::with_capacity(banks as usize + 1);
    let mut hashes = Vec::with_capacity(banks as usize + 1);
    let mut offset = 0;
    for _ in 0..banks {
        lengths.push(len);
        hashes.push(HashFn::xor_fold_with(offset, mask, PreOp::Div(struct_size)));
        offset += level;
    }

    // One extra bank sized to the struct, covering the low-order
    // struct-relative offset bits.
    lengths.push(struct_size.div_ceil(32).min(8));
    hashes.push(HashFn::struct_fold(struct_size));

    Ok(Filter::Banked(BankedFilter::with_banks(
        32, &lengths, &hashes,
    )?))
}

pub fn create_exact() -> Filter {
    Filter::Exact(ExactSetFilter::new())
}

pub fn create_range() -> Filter {
    Filter::Range(RangeFilter::new())
}

pub fn create_global_table() -> Filter {
    Filter::GlobalTable(GlobalHashTableFilter::new())
}

/// Bank count and per-bank length for budgets above 512 bits.
fn banked_ladder(bits: u32) -> (u32, u32) {
    if bits <= 1024 {
        (2, 16)
    } else if bits <= 2048 {
        (2, 32)
    } else if bits <= 3072 {
        (3, 32)
    } else if bits <= 4096 {
        (2, 64)
    } else {
        // Really big request.
        (2, 128)
    }
}
