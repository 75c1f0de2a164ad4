//! Signature family for depprof.
//!
//! A signature is a compact, possibly lossy encoding of a set of addresses
//! supporting insert and membership check. This crate provides:
//! - Value-type hash functions ([`HashFn`])
//! - The closed filter family ([`Filter`] and its variants)
//! - Deterministic factory functions mapping a bit budget to a concrete
//!   filter configuration ([`factory`])
//!
//! Every variant is sound: an inserted address is always reported present.
//! Variants differ in false-positive rate, memory footprint, and per-operation
//! cost; the factory ladders encode the tuned tradeoffs.

pub mod factory;
pub mod filter;
pub mod hash;

pub use filter::{
    init_global_table, ArrayBitsetFilter, BankedFilter, BitsetFilter, ExactSetFilter, Filter,
    FilterKind, GlobalHashTableFilter, HybridRangeBankedFilter, LoggingDecoratorFilter,
    RangeFilter,
};
pub use hash::{HashFn, PreOp};
