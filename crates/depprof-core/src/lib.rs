//! depprof Core - Core types and traits for dependence profiling
//!
//! This crate provides the fundamental abstractions for depprof:
//! - Query types describing candidate dependence pairs
//! - The region abstraction (single entry, multiple exits)
//! - Error types shared across the workspace

pub mod error;
pub mod query;
pub mod region;

pub use error::{DepProfError, Result};
pub use query::{InstrRef, PsetId, Query, QuerySet};
pub use region::{BasicBlock, FunctionBody, FunctionRegion, Region, TerminatorKind};
