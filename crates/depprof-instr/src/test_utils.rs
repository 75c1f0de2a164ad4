//! Shared helpers for scheduler and interpreter tests.

use depprof_core::{
    BasicBlock, FunctionBody, FunctionRegion, InstrRef, Query, QuerySet, TerminatorKind,
};

use crate::assign::{SetAssigner, UniformAssign};

/// A straight-line region containing the given instructions and one return.
pub fn straight_region(instrs: &[u32]) -> FunctionRegion {
    FunctionRegion::new(FunctionBody::new(vec![BasicBlock::new(
        instrs.iter().copied().map(InstrRef).collect(),
        InstrRef(9_999),
        TerminatorKind::Return,
    )]))
    .unwrap()
}

/// A region with one entry block branching to `n_exits` return blocks.
pub fn multi_exit_region(instrs: &[u32], n_exits: u32) -> FunctionRegion {
    let mut blocks = vec![BasicBlock::new(
        instrs.iter().copied().map(InstrRef).collect(),
        InstrRef(9_000),
        TerminatorKind::Branch,
    )];
    for i in 0..n_exits {
        blocks.push(BasicBlock::new(
            vec![],
            InstrRef(9_100 + i),
            TerminatorKind::Return,
        ));
    }
    FunctionRegion::new(FunctionBody::new(blocks)).unwrap()
}

/// Queries from (producer, consumer) pairs, ids in arrival order.
pub fn make_queries(pairs: &[(u32, u32)]) -> QuerySet {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &(p, c))| Query::new(i as u64, InstrRef(p), InstrRef(c)))
        .collect()
}

/// Queries planned with the uniform strategy at the given cap.
pub fn planned_queries(pairs: &[(u32, u32)], cap: i32) -> QuerySet {
    let mut qs = make_queries(pairs);
    UniformAssign::new(cap).assign(&mut qs);
    qs
}
