//! depprof - runtime dependence profiling.
//!
//! For pairs of memory accesses that static alias analysis could not
//! resolve, depprof decides at run time whether they actually touch
//! overlapping memory: each candidate pair-group gets a compact filter
//! encoding "addresses written so far", and reads are tested against it.
//!
//! The crates compose bottom-up:
//! - [`depprof_sig`] - hash functions, the filter family, and the factory
//! - [`depprof_instr`] - the assignment planner and the instrumentation
//!   scheduler, plus a reference interpreter
//! - [`depprof_config`] - TOML/YAML configuration
//! - [`depprof_runtime`] - the C-callable runtime ABI and profile
//!   persistence
//!
//! # Example
//!
//! ```
//! use depprof::assign::{SetAssigner, UniformAssign};
//! use depprof::interp::{run_activation, ActivationTrace};
//! use depprof::scheduler::{build_schedule, NoStructSizes, ScheduleOptions};
//! use depprof::{
//!     BasicBlock, FunctionBody, FunctionRegion, InstrRef, Query, QuerySet, TerminatorKind,
//! };
//!
//! // One store (i1), one load (i2), one candidate dependence between them.
//! let region = FunctionRegion::new(FunctionBody::new(vec![BasicBlock::new(
//!     vec![InstrRef(1), InstrRef(2)],
//!     InstrRef(3),
//!     TerminatorKind::Return,
//! )]))
//! .unwrap();
//! let mut queries: QuerySet = [Query::new(0, InstrRef(1), InstrRef(2))]
//!     .into_iter()
//!     .collect();
//! UniformAssign::new(-1).assign(&mut queries);
//!
//! let schedule =
//!     build_schedule(&region, &mut queries, &ScheduleOptions::default(), &NoStructSizes)
//!         .unwrap();
//!
//! // The store and the load touch the same address: dependence observed.
//! let trace: ActivationTrace = [(InstrRef(1), 0x1000), (InstrRef(2), 0x1000)]
//!     .into_iter()
//!     .collect();
//! assert!(run_activation(&schedule, &trace).outcomes[0].observed);
//! ```

pub use depprof_core::{
    BasicBlock, DepProfError, FunctionBody, FunctionRegion, InstrRef, PsetId, Query, QuerySet,
    Region, TerminatorKind,
};

pub use depprof_config::{ProfileConfig, ProfileMode, SignatureFlavor};

pub use depprof_instr::{
    build_schedule, ActivationTrace, FilterPolicy, QueryOutcome, QueryTotals, RegionProfiler,
    Schedule, ScheduleOptions, ScheduleSink,
};

pub use depprof_sig::{factory, Filter, FilterKind, HashFn};

pub use depprof_runtime::{
    FileStore, MemoryStore, ProfileContext, ProfileRecord, ProfileStore, RefIdAllocator,
};

// Module-level re-exports for callers that want the full surface.
pub use depprof_instr::{assign, interp, plan, scheduler};
pub use depprof_runtime::{abi, context, store};
pub use depprof_sig::{filter, hash};
