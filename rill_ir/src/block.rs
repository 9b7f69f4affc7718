//! Basic block definitions for the Rill IR

use crate::instr::InstrId;
use serde::{Deserialize, Serialize};

/// Stable identifier of a block within its subroutine's arena
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A basic block: no branches except the entry and exit branch
///
/// Phi instructions are kept apart from the ordinary instruction list so the
/// text form can group them first and the passes can skip them. Predecessor
/// and successor lists are maintained symmetrically by
/// [`Subroutine::add_pred`](crate::Subroutine::add_pred).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub(crate) name: String,
    pub(crate) phis: Vec<InstrId>,
    pub(crate) instrs: Vec<InstrId>,
    pub(crate) preds: Vec<BlockId>,
    pub(crate) succs: Vec<BlockId>,
}

impl BlockData {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phis: Vec::new(),
            instrs: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phis(&self) -> &[InstrId] {
        &self.phis
    }

    pub fn instrs(&self) -> &[InstrId] {
        &self.instrs
    }

    pub fn preds(&self) -> &[BlockId] {
        &self.preds
    }

    pub fn succs(&self) -> &[BlockId] {
        &self.succs
    }

    pub fn instr_count(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}
