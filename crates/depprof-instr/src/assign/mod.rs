//! Query-to-set assignment strategies.
//!
//! The planner decides which queries share a filter instance. Fewer sets
//! mean fewer filters and cheaper instrumentation but more cross-query
//! pollution; one set per producer is the precise (and expensive) extreme.

mod linear;
mod uniform;


use depprof_core::QuerySet;

pub use linear::LinearAssign;
pub use uniform::UniformAssign;

/// Annotates every query in the set with a profile set id.
pub trait SetAssigner {
    /// Assigns a pset to each query in arrival order and returns the number
    /// of distinct sets created.
    fn assign(&mut self, queries: &mut QuerySet) -> u64;
}
