//! The instrumentation scheduler.
//!
//! Builds a [`Schedule`] for one region: filters allocated at entry, inserts
//! at producers, deduplicated and cached checks at consumers, releases on
//! every exit path.

use std::collections::HashMap;

use depprof_config::{ConfigError, ProfileConfig, ProfileMode, SignatureFlavor};
use depprof_core::{InstrRef, PsetId, QuerySet, Region, Result};
use depprof_sig::{factory, Filter, FilterKind, LoggingDecoratorFilter};
use tracing::{debug, trace};

use crate::plan::{
    FilterDecl, FilterHandle, QueryBinding, Schedule, ScheduleStats, ScheduledOp, SlotId,
};

/// Which filter the scheduler allocates per profile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Inline signatures of the given budget and flavor.
    Signature { bits: u32, flavor: SignatureFlavor },
    /// Exact sets: the accuracy oracle.
    Perfect,
    /// Min/max ranges only.
    Range,
    /// The process-wide shared hash table.
    HashTable,
}

/// Supplies struct-size hints for producers, the way the original traced
/// store operands back to struct allocations. Absence of a hint degrades the
/// struct-aware flavor to the accurate one.
pub trait StructSizeOracle {
    fn struct_size(&self, producer: InstrRef) -> Option<u32>;
}

/// The no-hints oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStructSizes;

impl StructSizeOracle for NoStructSizes {
    fn struct_size(&self, _producer: InstrRef) -> Option<u32> {
        None
    }
}

/// Struct-size hints supplied up front, keyed by producer.
#[derive(Debug, Clone, Default)]
pub struct StructSizeMap {
    sizes: HashMap<InstrRef, u32>,
}

impl StructSizeMap {
    pub fn new() -> Self {
        StructSizeMap::default()
    }

    pub fn set(&mut self, producer: InstrRef, size: u32) {
        self.sizes.insert(producer, size);
    }
}

impl FromIterator<(InstrRef, u32)> for StructSizeMap {
    fn from_iter<I: IntoIterator<Item = (InstrRef, u32)>>(iter: I) -> Self {
        StructSizeMap {
            sizes: iter.into_iter().collect(),
        }
    }
}

impl StructSizeOracle for StructSizeMap {
    fn struct_size(&self, producer: InstrRef) -> Option<u32> {
        self.sizes.get(&producer).copied()
    }
}

/// Everything the scheduler needs beyond the region and its queries.
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub policy: FilterPolicy,
    /// Skip checks whose accumulator is already true.
    pub early_termination: bool,
    /// Collect filter populations on region exits.
    pub population_count: bool,
    /// Wrap the named query's filter in the mismatch-logging decorator.
    pub dump_refid: Option<u64>,
    /// Cap on the number of queries scheduled for this region.
    pub limit: Option<usize>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        ScheduleOptions {
            policy: FilterPolicy::Signature {
                bits: 1024,
                flavor: SignatureFlavor::Accurate,
            },
            early_termination: false,
            population_count: true,
            dump_refid: None,
            limit: None,
        }
    }
}

impl ScheduleOptions {
    /// Wires a loaded [`ProfileConfig`] into scheduler options.
    ///
    /// # Errors
    ///
    /// Propagates [`ProfileConfig::validate`] failures; invalid filter
    /// combinations must fail before any schedule is built.
    pub fn from_config(config: &ProfileConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let policy = match config.mode {
            ProfileMode::Signature => FilterPolicy::Signature {
                bits: config.signature.bits,
                flavor: config.signature.flavor,
            },
            ProfileMode::Perfect => FilterPolicy::Perfect,
            ProfileMode::Range => FilterPolicy::Range,
            ProfileMode::HashTable => FilterPolicy::HashTable,
        };
        Ok(ScheduleOptions {
            policy,
            early_termination: config.early_termination,
            population_count: config.population_count,
            dump_refid: config.dump_refid,
            limit: config.limit,
        })
    }
}

/// Builds the schedule for one region activation pattern.
///
/// Queries must already carry pset assignments (see [`crate::assign`]). The
/// `repeated` flag is written back onto the queries as a side product.
pub fn build_schedule<R: Region>(
    region: &R,
    queries: &mut QuerySet,
    opts: &ScheduleOptions,
    sizes: &impl StructSizeOracle,
) -> Result<Schedule> {
    let limit = opts.limit.unwrap_or(usize::MAX);
    let mut ops = Vec::new();
    let mut decls: Vec<FilterDecl> = Vec::new();
    let mut handle_of: HashMap<PsetId, FilterHandle> = HashMap::new();
    let mut stats = ScheduleStats::default();

    // Entry pass: one filter per profile set referenced by a scheduled query.
    for q in queries.iter().take(limit) {
        if !handle_of.contains_key(&q.pset) {
            let template = build_template(opts, sizes, q.producer)?;
            let handle = FilterHandle(decls.len() as u32);
            trace!(pset = q.pset, filter = %template.name(), "allocating filter");
            decls.push(FilterDecl {
                handle,
                pset: q.pset,
                template,
            });
            handle_of.insert(q.pset, handle);
            ops.push(ScheduledOp::Alloc { handle });
        }
        if opts.dump_refid == Some(q.id) {
            let handle = handle_of[&q.pset];
            let decl = &mut decls[handle.0 as usize];
            if decl.template.kind() != FilterKind::LoggingDecorator {
                debug!(refid = q.id, "wrapping filter in the mismatch logger");
                let inner = std::mem::replace(&mut decl.template, factory::create_range());
                decl.template =
                    Filter::Logging(LoggingDecoratorFilter::new(Box::new(inner), q.id));
            }
        }
    }

    if decls.is_empty() {
        debug!("no profile sets referenced; empty schedule");
        return Ok(Schedule {
            entry: region.entry_point(),
            exits: region.exit_points().to_vec(),
            decls,
            slot_count: 0,
            ops: Vec::new(),
            bindings: Vec::new(),
            stats,
            early_termination: opts.early_termination,
        });
    }

    ops.push(ScheduledOp::CountEntry);

    // Query pass: slots, inserts, checks, in arrival order.
    let mut slot_of: HashMap<(InstrRef, PsetId), SlotId> = HashMap::new();
    let mut inserted: HashMap<InstrRef, FilterHandle> = HashMap::new();
    let mut checked: HashMap<(InstrRef, PsetId), SlotId> = HashMap::new();
    let mut bindings = Vec::new();

    for q in queries.iter_mut().take(limit) {
        stats.queries += 1;
        let handle = handle_of[&q.pset];

        let (slot, repeated) = match slot_of.get(&(q.consumer, q.pset)) {
            Some(&slot) => {
                stats.repeated += 1;
                (slot, true)
            }
            None => {
                let slot = SlotId(slot_of.len() as u32);
                slot_of.insert((q.consumer, q.pset), slot);
                ops.push(ScheduledOp::AllocSlot { slot });
                stats.slots += 1;
                (slot, false)
            }
        };
        q.repeated = repeated;
        bindings.push(QueryBinding {
            id: q.id,
            slot,
            repeated,
            total: q.total,
        });

        // One insert per distinct producer per activation, whatever set it
        // first landed in.
        if !inserted.contains_key(&q.producer) {
            inserted.insert(q.producer, handle);
            ops.push(ScheduledOp::Insert {
                handle,
                producer: q.producer,
            });
            stats.inserts += 1;
        }

        if repeated {
            continue;
        }

        // One check per (consumer, pset) per activation; later queries against
        // the same pair reuse the cached result through the shared slot.
        if !checked.contains_key(&(q.consumer, q.pset)) {
            checked.insert((q.consumer, q.pset), slot);
            ops.push(ScheduledOp::Check {
                handle,
                consumer: q.consumer,
                slot,
                guarded: opts.early_termination,
            });
            stats.checks += 1;
        }
    }

    // Exit pass: every filter is released on every exit path; populations are
    // captured just before the release.
    for &exit in region.exit_points() {
        if opts.population_count {
            for decl in &decls {
                ops.push(ScheduledOp::Population {
                    handle: decl.handle,
                    exit,
                });
            }
        }
        for decl in &decls {
            ops.push(ScheduledOp::Free {
                handle: decl.handle,
                exit,
            });
        }
    }

    debug!(
        queries = stats.queries,
        repeated = stats.repeated,
        checks = stats.checks,
        inserts = stats.inserts,
        filters = decls.len(),
        "schedule built"
    );

    Ok(Schedule {
        entry: region.entry_point(),
        exits: region.exit_points().to_vec(),
        slot_count: slot_of.len() as u32,
        decls,
        ops,
        bindings,
        stats,
        early_termination: opts.early_termination,
    })
}

fn build_template(
    opts: &ScheduleOptions,
    sizes: &impl StructSizeOracle,
    producer: InstrRef,
) -> Result<Filter> {
    match opts.policy {
        FilterPolicy::Signature { bits, flavor } => match flavor {
            SignatureFlavor::Fast => factory::create_fast(bits),
            SignatureFlavor::Accurate => factory::create_accurate(bits),
            SignatureFlavor::Hybrid => factory::create_hybrid(bits),
            SignatureFlavor::StructAware => match sizes.struct_size(producer) {
                Some(size) if size >= factory::MIN_STRUCT_SIZE => {
                    debug!(%producer, size, "struct-aware signature");
                    factory::create_struct_aware(bits, size)
                }
                _ => factory::create_accurate(bits),
            },
        },
        FilterPolicy::Perfect => Ok(factory::create_exact()),
        FilterPolicy::Range => Ok(factory::create_range()),
        FilterPolicy::HashTable => Ok(factory::create_global_table()),
    }
}
