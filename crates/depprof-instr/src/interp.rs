//! Reference interpreter for schedules.
//!
//! Executes a schedule in-process against an observed activation trace,
//! maintaining real filter state. This is the in-repo realization of the
//! emission seam: the property tests drive it, and embedders can use it to
//! profile without generating code.

use std::collections::{BTreeMap, HashMap};

use depprof_core::{InstrRef, PsetId};
use depprof_sig::Filter;

use crate::plan::{Schedule, ScheduledOp};

/// One dynamic execution of a producer or consumer instruction.
#[derive(Debug, Clone, Copy)]
pub struct TraceEvent {
    pub instr: InstrRef,
    /// The effective address the instruction touched.
    pub addr: u64,
}

/// The observed dynamic history of one region activation: instruction
/// executions in order, ending when the region exits.
#[derive(Debug, Clone, Default)]
pub struct ActivationTrace {
    events: Vec<TraceEvent>,
}

impl ActivationTrace {
    pub fn new() -> Self {
        ActivationTrace::default()
    }

    pub fn push(&mut self, instr: InstrRef, addr: u64) {
        self.events.push(TraceEvent { instr, addr });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl FromIterator<(InstrRef, u64)> for ActivationTrace {
    fn from_iter<I: IntoIterator<Item = (InstrRef, u64)>>(iter: I) -> Self {
        ActivationTrace {
            events: iter
                .into_iter()
                .map(|(instr, addr)| TraceEvent { instr, addr })
                .collect(),
        }
    }
}

/// Final answer for one query after one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    pub id: u64,
    /// Whether any check contributing to this query came back true.
    pub observed: bool,
    pub repeated: bool,
}

/// Everything one activation produced.
#[derive(Debug, Clone)]
pub struct ActivationResult {
    /// Accumulator values, indexed by slot.
    pub slots: Vec<bool>,
    /// Per-query outcomes, in binding order.
    pub outcomes: Vec<QueryOutcome>,
    /// Filter population per profile set, captured at exit.
    pub populations: BTreeMap<PsetId, u32>,
    pub checks_executed: u64,
    pub checks_skipped: u64,
    pub inserts_executed: u64,
}

/// Runs one activation of the schedule over a trace.
pub fn run_activation(schedule: &Schedule, trace: &ActivationTrace) -> ActivationResult {
    let mut filters: Vec<Filter> = schedule
        .decls
        .iter()
        .map(|d| d.template.clone())
        .collect();
    let mut slots = vec![false; schedule.slot_count as usize];

    // Group the instruction-positioned ops by their instruction, preserving
    // schedule order within one instruction.
    let mut at_instr: HashMap<InstrRef, Vec<&ScheduledOp>> = HashMap::new();
    for op in &schedule.ops {
        match op {
            ScheduledOp::Insert { producer, .. } => {
                at_instr.entry(*producer).or_default().push(op);
            }
            ScheduledOp::Check { consumer, .. } => {
                at_instr.entry(*consumer).or_default().push(op);
            }
            _ => {}
        }
    }

    let mut checks_executed = 0;
    let mut checks_skipped = 0;
    let mut inserts_executed = 0;

    for event in trace.events() {
        let Some(ops) = at_instr.get(&event.instr) else {
            continue;
        };
        for op in ops {
            match **op {
                ScheduledOp::Insert { handle, .. } => {
                    filters[handle.0 as usize].insert(event.addr);
                    inserts_executed += 1;
                }
                ScheduledOp::Check {
                    handle,
                    slot,
                    guarded,
                    ..
                } => {
                    if guarded && slots[slot.0 as usize] {
                        // The accumulator can only move towards true, so a
                        // confirmed dependence makes the check dead weight.
                        checks_skipped += 1;
                    } else {
                        let hit = filters[handle.0 as usize].check(event.addr);
                        slots[slot.0 as usize] |= hit;
                        checks_executed += 1;
                    }
                }
                _ => {}
            }
        }
    }

    // The activation leaves through exactly one exit path; populations are
    // captured and every filter released there.
    let mut populations = BTreeMap::new();
    for decl in &schedule.decls {
        populations.insert(decl.pset, filters[decl.handle.0 as usize].population());
    }
    for filter in &mut filters {
        filter.free();
    }

    let outcomes = schedule
        .bindings
        .iter()
        .map(|b| QueryOutcome {
            id: b.id,
            observed: slots[b.slot.0 as usize],
            repeated: b.repeated,
        })
        .collect();

    ActivationResult {
        slots,
        outcomes,
        populations,
        checks_executed,
        checks_skipped,
        inserts_executed,
    }
}

/// Accumulated counters for one query across activations, in the shape the
/// persistence collaborator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTotals {
    pub id: u64,
    /// Activations in which the dependence was observed.
    pub count: u64,
    /// Executions observed in a prior run, carried through unchanged.
    pub total: u32,
    /// Region activations seen.
    pub entries: u64,
}

/// Runs a schedule over many activations, accumulating per-query counters
/// and per-set populations.
#[derive(Debug)]
pub struct RegionProfiler<'s> {
    schedule: &'s Schedule,
    counts: Vec<u64>,
    entries: u64,
    populations: BTreeMap<PsetId, u64>,
}

impl<'s> RegionProfiler<'s> {
    pub fn new(schedule: &'s Schedule) -> Self {
        RegionProfiler {
            counts: vec![0; schedule.bindings.len()],
            entries: 0,
            populations: BTreeMap::new(),
            schedule,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        self.schedule
    }

    /// Executes one activation and folds its outcomes into the totals.
    pub fn run(&mut self, trace: &ActivationTrace) -> ActivationResult {
        let result = run_activation(self.schedule, trace);
        self.entries += 1;
        for (count, outcome) in self.counts.iter_mut().zip(&result.outcomes) {
            *count += u64::from(outcome.observed);
        }
        for (&pset, &pop) in &result.populations {
            *self.populations.entry(pset).or_insert(0) += u64::from(pop);
        }
        result
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Cumulative population per profile set across activations.
    pub fn populations(&self) -> &BTreeMap<PsetId, u64> {
        &self.populations
    }

    /// Per-query totals in binding order.
    pub fn totals(&self) -> Vec<QueryTotals> {
        self.schedule
            .bindings
            .iter()
            .zip(&self.counts)
            .map(|(b, &count)| QueryTotals {
                id: b.id,
                count,
                total: b.total,
                entries: self.entries,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
