//! depprof instrumentation engine.
//!
//! This crate provides the two layers above the filter family:
//! - The assignment planner, grouping queries into profile sets that share
//!   one filter instance ([`assign`])
//! - The instrumentation scheduler, producing a per-region schedule of
//!   allocate/insert/check/free operations with dedup, caching, early
//!   termination, and exit cleanup ([`scheduler`])
//!
//! A schedule is an inert description; it reaches executable form through a
//! [`ScheduleSink`] (the code-emission seam) or through the in-process
//! reference interpreter ([`interp`]).

pub mod assign;
pub mod interp;
pub mod plan;
pub mod scheduler;

#[cfg(test)]
mod test_utils;

pub use assign::{LinearAssign, SetAssigner, UniformAssign};
pub use interp::{ActivationResult, ActivationTrace, QueryOutcome, QueryTotals, RegionProfiler};
pub use plan::{
    FilterDecl, FilterHandle, Position, QueryBinding, Schedule, ScheduleSink, ScheduleStats,
    ScheduledOp, SlotId,
};
pub use scheduler::{
    build_schedule, FilterPolicy, NoStructSizes, ScheduleOptions, StructSizeMap, StructSizeOracle,
};
