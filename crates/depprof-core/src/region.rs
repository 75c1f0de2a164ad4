//! The region abstraction: single-entry, possibly-multi-exit code scopes.
//!
//! A region owns the filter instances allocated at its entry and must release
//! them on every exit path. Today the only region kind is a function body;
//! the trait exists so other kinds (loops) can be added without touching the
//! scheduler.

use std::cell::OnceCell;

use smallvec::SmallVec;

use crate::error::{DepProfError, Result};
use crate::query::InstrRef;

/// A single-entry, multi-exit code scope.
pub trait Region {
    /// The instruction at which region-scoped allocations are placed.
    fn entry_point(&self) -> InstrRef;

    /// Every instruction before which region-scoped releases must be placed.
    /// Lazily computed and cached by implementations.
    fn exit_points(&self) -> &[InstrRef];
}

/// How a basic block leaves the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatorKind {
    /// Leaves the region; the terminator is an exit point.
    Return,
    /// Transfers control within the region.
    Branch,
}

/// A basic block in the minimal function body model.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Instructions in the block, in program order.
    pub instrs: Vec<InstrRef>,
    /// The block terminator.
    pub terminator: InstrRef,
    pub kind: TerminatorKind,
}

impl BasicBlock {
    pub fn new(instrs: Vec<InstrRef>, terminator: InstrRef, kind: TerminatorKind) -> Self {
        BasicBlock {
            instrs,
            terminator,
            kind,
        }
    }
}

/// Minimal function body: an entry block followed by any number of others.
#[derive(Debug, Clone)]
pub struct FunctionBody {
    pub blocks: Vec<BasicBlock>,
}

impl FunctionBody {
    pub fn new(blocks: Vec<BasicBlock>) -> Self {
        FunctionBody { blocks }
    }
}

/// Region over one function body. Exits are the return terminators.
#[derive(Debug)]
pub struct FunctionRegion {
    body: FunctionBody,
    exits: OnceCell<SmallVec<[InstrRef; 4]>>,
}

impl FunctionRegion {
    /// Wraps a function body.
    ///
    /// # Errors
    ///
    /// Returns [`DepProfError::InvalidRegion`] if the body has no blocks or no
    /// return terminator: a region without an exit path cannot release what
    /// its entry allocates.
    pub fn new(body: FunctionBody) -> Result<Self> {
        if body.blocks.is_empty() {
            return Err(DepProfError::InvalidRegion(
                "function body has no blocks".to_string(),
            ));
        }
        if !body
            .blocks
            .iter()
            .any(|b| b.kind == TerminatorKind::Return)
        {
            return Err(DepProfError::InvalidRegion(
                "function body has no return terminator".to_string(),
            ));
        }
        Ok(FunctionRegion {
            body,
            exits: OnceCell::new(),
        })
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }
}

impl Region for FunctionRegion {
    fn entry_point(&self) -> InstrRef {
        let entry = &self.body.blocks[0];
        entry.instrs.first().copied().unwrap_or(entry.terminator)
    }

    fn exit_points(&self) -> &[InstrRef] {
        self.exits.get_or_init(|| {
            self.body
                .blocks
                .iter()
                .filter(|b| b.kind == TerminatorKind::Return)
                .map(|b| b.terminator)
                .collect()
        })
    }
}
