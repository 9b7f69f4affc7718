//! Dead instruction elimination
//!
//! Removes unused assignment instructions from a block and chases the
//! variables they read: anything that becomes unused in turn is removed as
//! well, even when the use chain crosses into other blocks. Calls are never
//! removed (they may have side effects), and not all dead code is caught;
//! this is local cleanup, not a global DCE.

use crate::manager::BlockPass;
use log::debug;
use rill_common::RillResult;
use rill_ir::{BlockId, InstrId, Subroutine};

/// The dead instruction elimination pass
#[derive(Debug, Clone, Copy, Default)]
pub struct Dia;

impl Dia {
    pub fn new() -> Self {
        Self
    }

    fn is_removable(sub: &Subroutine, instr: InstrId) -> bool {
        sub.instr_block(instr).is_some()
            && sub.is_assignment(instr)
            && !sub.is_call(instr)
            && !sub.is_used(instr)
    }

    /// Removes an instruction through its own block, then tries the
    /// variables it used, which may just have become dead
    fn remove_dead(&self, sub: &mut Subroutine, instr: InstrId) -> RillResult<()> {
        let used_vars: Vec<InstrId> = sub.used_vars(instr).to_vec();
        if sub.is_phi(instr) {
            sub.remove_phi_instr(instr)?;
        } else {
            sub.remove_instr(instr)?;
        }
        debug!("removed dead instruction {:?}", instr);
        for var in used_vars {
            if Self::is_removable(sub, var) {
                self.remove_dead(sub, var)?;
            }
        }
        Ok(())
    }
}

impl BlockPass for Dia {
    fn run_pass(&mut self, sub: &mut Subroutine, block: BlockId) -> RillResult<()> {
        // Snapshot the list: removal mutates it, and cascading removal can
        // reach instructions that appear later in the snapshot
        let instrs: Vec<InstrId> = sub.block_instrs(block).to_vec();
        for instr in instrs {
            if Self::is_removable(sub, instr) {
                self.remove_dead(sub, instr)?;
            }
        }
        Ok(())
    }
}
