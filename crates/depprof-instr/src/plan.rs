//! The instrumentation schedule: an inert description of what to execute.
//!
//! A schedule names filter templates, accumulator slots, and a sequence of
//! operations, each positioned at an instruction reference. It becomes
//! executable either through a [`ScheduleSink`] (an external code-emission
//! backend) or through the reference interpreter.

use depprof_core::{InstrRef, PsetId};
use depprof_sig::Filter;

/// Index of a filter declaration within one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterHandle(pub u32);

/// Index of an accumulator slot within one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u32);

/// Where an operation is placed relative to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// At the region entry, before any query-visible instruction.
    Entry,
    /// Immediately before the named instruction.
    At(InstrRef),
    /// On the exit path through the named instruction.
    Exit(InstrRef),
}

/// A filter template bound to a profile set.
///
/// Each region activation clones the template, so activations never share
/// state (the global hash table excepted, by its nature).
#[derive(Debug, Clone)]
pub struct FilterDecl {
    pub handle: FilterHandle,
    pub pset: PsetId,
    pub template: Filter,
}

/// One scheduled operation.
#[derive(Debug, Clone)]
pub enum ScheduledOp {
    /// Instantiate the declared filter. Placed at entry.
    Alloc { handle: FilterHandle },
    /// Zero-initialize an accumulator slot. Placed at entry.
    AllocSlot { slot: SlotId },
    /// Bump the region activation counter. Placed at entry.
    CountEntry,
    /// Insert the producer's effective address into the filter.
    Insert {
        handle: FilterHandle,
        producer: InstrRef,
    },
    /// Check the consumer's effective address against the filter and OR the
    /// result into the slot. When `guarded`, the check is skipped (by
    /// branching on the slot) once the slot is already true.
    Check {
        handle: FilterHandle,
        consumer: InstrRef,
        slot: SlotId,
        guarded: bool,
    },
    /// Accumulate the filter's population into its pset counter.
    Population { handle: FilterHandle, exit: InstrRef },
    /// Release the filter instance.
    Free { handle: FilterHandle, exit: InstrRef },
}

impl ScheduledOp {
    /// The position this operation is emitted at.
    pub fn position(&self) -> Position {
        match *self {
            ScheduledOp::Alloc { .. }
            | ScheduledOp::AllocSlot { .. }
            | ScheduledOp::CountEntry => Position::Entry,
            ScheduledOp::Insert { producer, .. } => Position::At(producer),
            ScheduledOp::Check { consumer, .. } => Position::At(consumer),
            ScheduledOp::Population { exit, .. } | ScheduledOp::Free { exit, .. } => {
                Position::Exit(exit)
            }
        }
    }
}

/// Per-query slot binding, connecting schedule output back to query ids.
#[derive(Debug, Clone)]
pub struct QueryBinding {
    pub id: u64,
    pub slot: SlotId,
    /// An earlier query already covers this (consumer, pset) pair; this one
    /// shares its slot and scheduled no check of its own.
    pub repeated: bool,
    /// Executions observed in a prior run, carried through to persistence.
    pub total: u32,
}

/// Counters describing what the scheduler emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Queries scheduled (after any limit).
    pub queries: u64,
    /// Queries marked repeated.
    pub repeated: u64,
    /// Accumulator slots allocated.
    pub slots: u64,
    /// Membership checks scheduled.
    pub checks: u64,
    /// Insertions scheduled.
    pub inserts: u64,
}

/// The code-emission seam: an externally supplied mechanism that realizes
/// each scheduled operation in some target representation.
pub trait ScheduleSink {
    type Error;

    fn alloc_filter(&mut self, decl: &FilterDecl) -> Result<(), Self::Error>;
    fn alloc_slot(&mut self, slot: SlotId) -> Result<(), Self::Error>;
    fn count_entry(&mut self) -> Result<(), Self::Error>;
    fn insert(&mut self, handle: FilterHandle, producer: InstrRef) -> Result<(), Self::Error>;
    fn check(
        &mut self,
        handle: FilterHandle,
        consumer: InstrRef,
        slot: SlotId,
        guarded: bool,
    ) -> Result<(), Self::Error>;
    fn population(&mut self, handle: FilterHandle, exit: InstrRef) -> Result<(), Self::Error>;
    fn free(&mut self, handle: FilterHandle, exit: InstrRef) -> Result<(), Self::Error>;
}

/// A complete per-region instrumentation schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub entry: InstrRef,
    pub exits: Vec<InstrRef>,
    /// Filter declarations, indexed by handle.
    pub decls: Vec<FilterDecl>,
    pub slot_count: u32,
    /// Operations in emission order.
    pub ops: Vec<ScheduledOp>,
    /// One binding per scheduled query, in arrival order.
    pub bindings: Vec<QueryBinding>,
    pub stats: ScheduleStats,
    pub early_termination: bool,
}

impl Schedule {
    /// True when no query referenced any profile set; nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn decl(&self, handle: FilterHandle) -> &FilterDecl {
        &self.decls[handle.0 as usize]
    }

    /// Feeds every operation, in order, to a sink.
    pub fn replay<S: ScheduleSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        for op in &self.ops {
            match *op {
                ScheduledOp::Alloc { handle } => sink.alloc_filter(self.decl(handle))?,
                ScheduledOp::AllocSlot { slot } => sink.alloc_slot(slot)?,
                ScheduledOp::CountEntry => sink.count_entry()?,
                ScheduledOp::Insert { handle, producer } => sink.insert(handle, producer)?,
                ScheduledOp::Check {
                    handle,
                    consumer,
                    slot,
                    guarded,
                } => sink.check(handle, consumer, slot, guarded)?,
                ScheduledOp::Population { handle, exit } => sink.population(handle, exit)?,
                ScheduledOp::Free { handle, exit } => sink.free(handle, exit)?,
            }
        }
        Ok(())
    }
}
