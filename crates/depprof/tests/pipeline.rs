//! End-to-end: configuration -> planning -> scheduling -> interpretation ->
//! persistence.

use depprof::assign::{LinearAssign, SetAssigner, UniformAssign};
use depprof::interp::{ActivationTrace, RegionProfiler};
use depprof::scheduler::{build_schedule, NoStructSizes, ScheduleOptions};
use depprof::{
    BasicBlock, FunctionBody, FunctionRegion, InstrRef, MemoryStore, ProfileConfig,
    ProfileContext, ProfileRecord, Query, QuerySet, RefIdAllocator, TerminatorKind,
};

fn region(instrs: &[u32]) -> FunctionRegion {
    FunctionRegion::new(FunctionBody::new(vec![
        BasicBlock::new(
            instrs.iter().copied().map(InstrRef).collect(),
            InstrRef(900),
            TerminatorKind::Branch,
        ),
        BasicBlock::new(vec![], InstrRef(901), TerminatorKind::Return),
        BasicBlock::new(vec![], InstrRef(902), TerminatorKind::Return),
    ]))
    .unwrap()
}

fn trace(events: &[(u32, u64)]) -> ActivationTrace {
    events
        .iter()
        .map(|&(i, a)| (InstrRef(i), a))
        .collect()
}

#[test]
fn config_to_persisted_counters() {
    let config = ProfileConfig::from_toml_str(
        r#"
        mode = "perfect"
        early_termination = true

        [assignment]
        strategy = "linear"
        "#,
    )
    .unwrap();
    let opts = ScheduleOptions::from_config(&config).unwrap();

    // Two stores into one load, one independent pair.
    let mut queries: QuerySet = [
        Query::new(0, InstrRef(1), InstrRef(10)),
        Query::new(1, InstrRef(2), InstrRef(10)),
        Query::new(2, InstrRef(3), InstrRef(11)),
    ]
    .into_iter()
    .collect();
    let sets = LinearAssign::new().assign(&mut queries);
    assert_eq!(sets, 2);

    let region = region(&[1, 2, 3, 10, 11]);
    let schedule = build_schedule(&region, &mut queries, &opts, &NoStructSizes).unwrap();
    assert_eq!(schedule.exits.len(), 2);

    let mut profiler = RegionProfiler::new(&schedule);
    // Activation 1: store 1 and the load overlap.
    profiler.run(&trace(&[(1, 0x1000), (2, 0x2000), (10, 0x1000), (11, 0x5000)]));
    // Activation 2: nothing overlaps.
    profiler.run(&trace(&[(1, 0x1000), (2, 0x2000), (10, 0x3000), (11, 0x5000)]));
    // Activation 3: store 3 feeds load 11.
    profiler.run(&trace(&[(3, 0x7000), (11, 0x7000)]));

    let totals = profiler.totals();
    assert_eq!(totals[0].count, 1);
    // Query 1 shares query 0's accumulator (same load, same set).
    assert_eq!(totals[1].count, 1);
    assert_eq!(totals[2].count, 1);
    assert!(totals.iter().all(|t| t.entries == 3));

    // Hand the counters to the persistence collaborator.
    let mut ctx = ProfileContext::new(
        "pipeline-test",
        "demo.c",
        1,
        RefIdAllocator::new(0),
        Box::new(MemoryStore::new()),
    );
    ctx.stage(totals.iter().map(|t| ProfileRecord {
        refid: t.id,
        count: t.count,
        total: t.total,
        entries: t.entries,
        extra: 0,
        population: 0,
    }));
    ctx.flush().unwrap();
    assert_eq!(ctx.feedback(0), Some(1));
    assert_eq!(ctx.feedback(99), None);
}

#[test]
fn uniform_capped_pipeline_with_signatures() {
    let mut queries: QuerySet = (0..6)
        .map(|i| Query::new(i, InstrRef(1 + i as u32), InstrRef(20 + i as u32)))
        .collect();
    UniformAssign::new(2).assign(&mut queries);

    let region = region(&[1, 2, 3, 4, 5, 6, 20, 21, 22, 23, 24, 25]);
    let schedule = build_schedule(
        &region,
        &mut queries,
        &ScheduleOptions::default(),
        &NoStructSizes,
    )
    .unwrap();
    // Six producers at cap 2: three filters.
    assert_eq!(schedule.decls.len(), 3);

    // Every producer writes an address its consumer then reads: signatures
    // never produce false negatives, so all six dependences are observed.
    let events: Vec<(u32, u64)> = (0..6)
        .flat_map(|i| {
            let addr = 0x1000 + u64::from(i) * 0x40;
            [(1 + i, addr), (20 + i, addr)]
        })
        .collect();
    let result = depprof::interp::run_activation(&schedule, &trace(&events));
    assert!(result.outcomes.iter().all(|o| o.observed));
}
