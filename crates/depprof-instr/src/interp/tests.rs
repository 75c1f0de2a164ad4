//! Interpreter semantics: accumulation, sharing, early-termination
//! equivalence.

use depprof_config::SignatureFlavor;
use depprof_core::InstrRef;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::scheduler::{build_schedule, FilterPolicy, NoStructSizes, ScheduleOptions};
use crate::test_utils::{planned_queries, straight_region};

fn perfect_opts() -> ScheduleOptions {
    ScheduleOptions {
        policy: FilterPolicy::Perfect,
        ..ScheduleOptions::default()
    }
}

fn trace(events: &[(u32, u64)]) -> ActivationTrace {
    events
        .iter()
        .map(|&(instr, addr)| (InstrRef(instr), addr))
        .collect()
}

#[test]
fn overlapping_accesses_are_observed() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    let hit = run_activation(&schedule, &trace(&[(1, 0x1000), (10, 0x1000)]));
    assert!(hit.outcomes[0].observed);

    let miss = run_activation(&schedule, &trace(&[(1, 0x1000), (10, 0x2000)]));
    assert!(!miss.outcomes[0].observed);
}

#[test]
fn accumulator_is_the_or_of_all_checks() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    // First read misses, second read hits; the final answer is still true.
    let result = run_activation(
        &schedule,
        &trace(&[(10, 0x9000), (1, 0x1000), (10, 0x1000)]),
    );
    assert!(result.outcomes[0].observed);
    assert_eq!(result.checks_executed, 2);

    // Order matters: a read before the only write sees nothing.
    let result = run_activation(&schedule, &trace(&[(10, 0x1000), (1, 0x1000)]));
    assert!(!result.outcomes[0].observed);
}

#[test]
fn repeated_queries_share_their_slot() {
    let region = straight_region(&[1, 2, 10]);
    let mut qs = planned_queries(&[(1, 10), (2, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    // Only the second query's producer overlaps the read, but both queries
    // report through the shared accumulator.
    let result = run_activation(
        &schedule,
        &trace(&[(1, 0x1000), (2, 0x3000), (10, 0x3000)]),
    );
    assert!(result.outcomes[0].observed);
    assert!(result.outcomes[1].observed);
    assert!(!result.outcomes[0].repeated);
    assert!(result.outcomes[1].repeated);
    assert_eq!(result.checks_executed, 1);
}

#[test]
fn unexecuted_instructions_contribute_nothing() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    let result = run_activation(&schedule, &trace(&[(3, 0x1000), (4, 0x1000)]));
    assert!(!result.outcomes[0].observed);
    assert_eq!(result.checks_executed, 0);
    assert_eq!(result.inserts_executed, 0);
}

#[test]
fn populations_are_captured_at_exit() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    let result = run_activation(
        &schedule,
        &trace(&[(1, 0x1000), (1, 0x2000), (1, 0x3000), (1, 0x1000)]),
    );
    assert_eq!(result.populations[&0], 3);
}

#[test]
fn activations_are_independent() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    let first = run_activation(&schedule, &trace(&[(1, 0x1000), (10, 0x1000)]));
    assert!(first.outcomes[0].observed);
    // The filter allocated by the previous activation was freed with it.
    let second = run_activation(&schedule, &trace(&[(10, 0x1000)]));
    assert!(!second.outcomes[0].observed);
}

#[test]
fn profiler_accumulates_across_activations() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let schedule = build_schedule(&region, &mut qs, &perfect_opts(), &NoStructSizes).unwrap();

    let mut profiler = RegionProfiler::new(&schedule);
    profiler.run(&trace(&[(1, 0x1000), (10, 0x1000)]));
    profiler.run(&trace(&[(1, 0x1000), (10, 0x2000)]));
    profiler.run(&trace(&[(1, 0x4000), (10, 0x4000)]));

    let totals = profiler.totals();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].count, 2);
    assert_eq!(totals[0].entries, 3);
    assert_eq!(profiler.entries(), 3);
}

#[test]
fn early_termination_skips_confirmed_checks() {
    let region = straight_region(&[1, 10]);
    let mut qs = planned_queries(&[(1, 10)], -1);
    let opts = ScheduleOptions {
        early_termination: true,
        ..perfect_opts()
    };
    let schedule = build_schedule(&region, &mut qs, &opts, &NoStructSizes).unwrap();

    let result = run_activation(
        &schedule,
        &trace(&[(1, 0x1000), (10, 0x1000), (10, 0x2000), (10, 0x3000)]),
    );
    assert!(result.outcomes[0].observed);
    assert_eq!(result.checks_executed, 1);
    assert_eq!(result.checks_skipped, 2);
}

/// Random traces over random query shapes, outcomes compared between the
/// guarded and unguarded schedules. Early termination is a pure control-flow
/// optimization, so every accumulator must be bit-identical.
#[test]
fn early_termination_never_changes_outcomes() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0DDB);
    for round in 0..30usize {
        let producers: Vec<u32> = (1..=4).collect();
        let consumers: Vec<u32> = (10..=13).collect();
        let pairs: Vec<(u32, u32)> = (0..8)
            .map(|_| {
                (
                    producers[rng.random_range(0..producers.len())],
                    consumers[rng.random_range(0..consumers.len())],
                )
            })
            .collect();
        let instrs: Vec<u32> = producers.iter().chain(&consumers).copied().collect();
        let region = straight_region(&instrs);
        let cap = [-1i32, 1, 2][round % 3];

        // The signature policy exercises false positives; perfect is exact.
        for policy in [
            FilterPolicy::Perfect,
            FilterPolicy::Signature {
                bits: 64,
                flavor: SignatureFlavor::Fast,
            },
        ] {
            let mut plain_qs = planned_queries(&pairs, cap);
            let mut guarded_qs = planned_queries(&pairs, cap);
            let plain = build_schedule(
                &region,
                &mut plain_qs,
                &ScheduleOptions {
                    policy,
                    ..ScheduleOptions::default()
                },
                &NoStructSizes,
            )
            .unwrap();
            let guarded = build_schedule(
                &region,
                &mut guarded_qs,
                &ScheduleOptions {
                    policy,
                    early_termination: true,
                    ..ScheduleOptions::default()
                },
                &NoStructSizes,
            )
            .unwrap();

            for _ in 0..10 {
                let events: Vec<(u32, u64)> = (0..40)
                    .map(|_| {
                        (
                            instrs[rng.random_range(0..instrs.len())],
                            rng.random_range(0..0x80u64) * 4,
                        )
                    })
                    .collect();
                let t = trace(&events);
                let a = run_activation(&plain, &t);
                let b = run_activation(&guarded, &t);
                assert_eq!(a.slots, b.slots, "accumulators diverged");
                assert_eq!(a.outcomes, b.outcomes, "outcomes diverged");
            }
        }
    }
}
