//! The filter family.
//!
//! A closed set of variants behind one tagged enum rather than a trait-object
//! hierarchy: the set of filter kinds is part of the design, and schedules
//! clone filter templates per region activation, which an enum makes cheap
//! and explicit.
//!
//! # Variants
//!
//! - [`BitsetFilter`] - one fixed-width word, single hash
//! - [`ArrayBitsetFilter`] - word array, touches one word per operation
//! - [`BankedFilter`] - AND of independent array banks
//! - [`RangeFilter`] - min/max bounds, coarse but exact at the extremes
//! - [`HybridRangeBankedFilter`] - range gate in front of a banked filter
//! - [`ExactSetFilter`] - heap-backed exact set, the accuracy oracle
//! - [`GlobalHashTableFilter`] - process-wide shared bit table
//! - [`LoggingDecoratorFilter`] - mismatch-logging wrapper around any variant

mod array;
mod banked;
mod bitset;
mod exact;
mod global_table;
mod hybrid;
mod logging;
mod range;

#[cfg(test)]
mod tests;

pub use array::ArrayBitsetFilter;
pub use banked::BankedFilter;
pub use bitset::BitsetFilter;
pub use exact::ExactSetFilter;
pub use global_table::{init_global_table, GlobalHashTableFilter};
pub use hybrid::HybridRangeBankedFilter;
pub use logging::LoggingDecoratorFilter;
pub use range::RangeFilter;

/// Discriminant of a [`Filter`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Bitset,
    ArrayBitset,
    Banked,
    Range,
    HybridRangeBanked,
    ExactSet,
    GlobalHashTable,
    LoggingDecorator,
}

/// A member of the filter family.
///
/// Every variant is sound: after `insert(a)` on a live filter, `check(a)`
/// returns true. Only [`ExactSetFilter`] (and decorators around it) are also
/// free of false positives.
#[derive(Debug, Clone)]
pub enum Filter {
    Bitset(BitsetFilter),
    Array(ArrayBitsetFilter),
    Banked(BankedFilter),
    Range(RangeFilter),
    Hybrid(HybridRangeBankedFilter),
    Exact(ExactSetFilter),
    GlobalTable(GlobalHashTableFilter),
    Logging(LoggingDecoratorFilter),
}

impl Filter {
    /// Records an address as written.
    pub fn insert(&mut self, addr: u64) {
        match self {
            Filter::Bitset(f) => f.insert(addr),
            Filter::Array(f) => f.insert(addr),
            Filter::Banked(f) => f.insert(addr),
            Filter::Range(f) => f.insert(addr),
            Filter::Hybrid(f) => f.insert(addr),
            Filter::Exact(f) => f.insert(addr),
            Filter::GlobalTable(f) => f.insert(addr),
            Filter::Logging(f) => f.insert(addr),
        }
    }

    /// Tests whether an address may have been written.
    pub fn check(&self, addr: u64) -> bool {
        match self {
            Filter::Bitset(f) => f.check(addr),
            Filter::Array(f) => f.check(addr),
            Filter::Banked(f) => f.check(addr),
            Filter::Range(f) => f.check(addr),
            Filter::Hybrid(f) => f.check(addr),
            Filter::Exact(f) => f.check(addr),
            Filter::GlobalTable(f) => f.check(addr),
            Filter::Logging(f) => f.check(addr),
        }
    }

    /// Approximate count of members. Kinds that do not track population
    /// report zero.
    pub fn population(&self) -> u32 {
        match self {
            Filter::Banked(f) => f.population(),
            Filter::Range(f) => f.population(),
            Filter::Hybrid(f) => f.population(),
            Filter::Exact(f) => f.population(),
            Filter::Logging(f) => f.population(),
            Filter::Bitset(_) | Filter::Array(_) | Filter::GlobalTable(_) => 0,
        }
    }

    /// Releases heap-backed state. A no-op for kinds whose storage is
    /// reclaimed with the region.
    pub fn free(&mut self) {
        match self {
            Filter::Exact(f) => f.free(),
            Filter::Logging(f) => f.free(),
            _ => {}
        }
    }

    /// Whether [`Filter::free`] is mandatory on region exit for this kind.
    pub fn needs_free(&self) -> bool {
        matches!(self, Filter::Exact(_) | Filter::Logging(_))
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Bitset(_) => FilterKind::Bitset,
            Filter::Array(_) => FilterKind::ArrayBitset,
            Filter::Banked(_) => FilterKind::Banked,
            Filter::Range(_) => FilterKind::Range,
            Filter::Hybrid(_) => FilterKind::HybridRangeBanked,
            Filter::Exact(_) => FilterKind::ExactSet,
            Filter::GlobalTable(_) => FilterKind::GlobalHashTable,
            Filter::Logging(_) => FilterKind::LoggingDecorator,
        }
    }

    /// Diagnostic name encoding the configuration, e.g. `banked_2x512`.
    pub fn name(&self) -> String {
        match self {
            Filter::Bitset(f) => f.name(),
            Filter::Array(f) => f.name(),
            Filter::Banked(f) => f.name(),
            Filter::Range(_) => "range".to_string(),
            Filter::Hybrid(f) => f.name(),
            Filter::Exact(_) => "exact_set".to_string(),
            Filter::GlobalTable(_) => "global_table".to_string(),
            Filter::Logging(f) => f.name(),
        }
    }
}
