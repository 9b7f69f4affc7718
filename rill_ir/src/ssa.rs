//! Incremental pruned-SSA construction
//!
//! Converts a program into pruned SSA form on the fly, in the style of
//! Braun et al.: phi functions are placed lazily as the front-end asks for
//! reaching definitions, unsealed blocks get provisional phis that are
//! completed at seal time, and phis that turn out to merge a single value
//! are rewritten away recursively. The algorithm needs no dominator tree
//! and is also useful for SSA reconstruction.

use crate::block::BlockId;
use crate::instr::{InstrId, InstrKind};
use crate::subroutine::Subroutine;
use crate::types::Type;
use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};
use log::trace;
use rill_common::{RillError, RillResult};

/// Per-variable construction state: the next SSA number to hand out and the
/// most recent definition per block
#[derive(Debug, Clone, Default)]
struct SsaDef {
    count: u32,
    current_def: HashMap<String, InstrId>,
}

/// On-the-fly SSA construction state for one subroutine
#[derive(Debug, Clone, Default)]
pub struct SsaBuilder {
    variables: HashMap<String, SsaDef>,
    /// Phis placed while their block was unsealed, in placement order
    incomplete_phis: HashMap<String, Vec<(String, InstrId)>>,
    sealed_blocks: HashSet<String>,
}

impl SsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sealed(&self, sub: &Subroutine, block: BlockId) -> bool {
        self.sealed_blocks.contains(sub.block_name(block))
    }

    /// Registers a new definition of a variable and stamps its SSA number.
    /// Returns `instr` back to facilitate on-the-fly building.
    pub fn new_variable(
        &mut self,
        sub: &mut Subroutine,
        instr: InstrId,
        block: BlockId,
    ) -> RillResult<InstrId> {
        let name = sub
            .var_name(instr)
            .ok_or(RillError::MistypedOperand { opcode: "new_variable" })?
            .to_string();
        let block_name = sub.block_name(block).to_string();
        let ssa_id = match self.variables.entry(name) {
            Entry::Vacant(entry) => {
                let mut current_def = HashMap::new();
                current_def.insert(block_name, instr);
                entry.insert(SsaDef { count: 0, current_def });
                0
            }
            Entry::Occupied(mut entry) => {
                let def = entry.get_mut();
                def.count += 1;
                def.current_def.insert(block_name, instr);
                def.count
            }
        };
        sub.set_ssa_id(instr, ssa_id);
        Ok(instr)
    }

    /// Looks for the reaching definition of a variable in a basic block
    pub fn get_reaching_def(
        &mut self,
        sub: &mut Subroutine,
        name: &str,
        block: BlockId,
    ) -> RillResult<InstrId> {
        let block_name = sub.block_name(block);
        if let Some(&instr) = self
            .variables
            .get(name)
            .and_then(|def| def.current_def.get(block_name))
        {
            return Ok(instr);
        }
        self.get_reaching_def_recursive(sub, name, block)
    }

    /// Recursively looks for the reaching definition of a variable. This
    /// method shouldn't be used directly (with the exception of testing).
    pub fn get_reaching_def_recursive(
        &mut self,
        sub: &mut Subroutine,
        name: &str,
        block: BlockId,
    ) -> RillResult<InstrId> {
        let block_name = sub.block_name(block).to_string();
        if !self.sealed_blocks.contains(&block_name) {
            // The CFG is incomplete here: place a provisional phi that will
            // be scrutinized when the block is sealed
            let phi = sub.new_phi(name, Type::Void);
            sub.add_phi_instr(block, phi)?;
            self.new_variable(sub, phi, block)?;
            self.incomplete_phis
                .entry(block_name.clone())
                .or_default()
                .push((name.to_string(), phi));
            trace!("placed incomplete phi for `{}` in .{}", name, block_name);
            Ok(phi)
        } else if sub.preds(block).len() == 1 {
            // A single predecessor holds the reaching definition; no phi needed
            let pred = sub.preds(block)[0];
            self.get_reaching_def(sub, name, pred)
        } else {
            // Register an operandless phi first to break the cycles that
            // appear when the operand search reaches this block again
            let phi = sub.new_phi(name, Type::Void);
            sub.add_phi_instr(block, phi)?;
            self.new_variable(sub, phi, block)?;
            self.add_phi_operands(sub, name, phi)
        }
    }

    /// Adds operands to a phi by looking for the reaching definition in each
    /// predecessor of the phi's block, then checks it for redundancy
    fn add_phi_operands(
        &mut self,
        sub: &mut Subroutine,
        name: &str,
        phi: InstrId,
    ) -> RillResult<InstrId> {
        let block = sub.instr_block(phi).ok_or(RillError::MissingInstr)?;
        let preds: Vec<BlockId> = sub.preds(block).to_vec();
        for pred in preds {
            let def = self.get_reaching_def(sub, name, pred)?;
            sub.add_phi_input(phi, def)?;
        }
        self.remove_trivial_phi(sub, phi)
    }

    /// Checks whether a phi merges more than one distinct value; if not, the
    /// phi is rewritten to that value and its phi users are re-checked
    pub fn remove_trivial_phi(
        &mut self,
        sub: &mut Subroutine,
        phi: InstrId,
    ) -> RillResult<InstrId> {
        if sub.instr_block(phi).is_none() {
            return Err(RillError::MissingInstr);
        }
        let (name, inputs) = match sub.instr_kind(phi) {
            InstrKind::Phi { def, inputs } => (def.name.clone(), inputs.clone()),
            _ => return Err(RillError::ExpectedPhi),
        };
        let mut same: Option<InstrId> = None;
        for input in inputs {
            if Some(input) == same || input == phi {
                // A repetition or a self-reference
                continue;
            }
            if same.is_some() {
                // The phi merges at least two values: non-trivial
                return Ok(phi);
            }
            same = Some(input);
        }
        // Only self-references remain: the variable was never defined on
        // some path, which the construction contract rules out
        let same = same.ok_or_else(|| RillError::undefined_variable(name.as_str()))?;

        trace!(
            "phi `{}` is trivial, rewriting its users to `{:?}`",
            name,
            same
        );
        sub.detach_phi(phi)?;
        let users: Vec<InstrId> = sub
            .users(phi)
            .iter()
            .copied()
            .filter(|&u| u != phi)
            .collect();
        sub.replace_by(phi, same)?;
        // Redirect every current-definition entry still pointing at the phi
        if let Some(def) = self.variables.get_mut(&name) {
            for current in def.current_def.values_mut() {
                if *current == phi {
                    *current = same;
                }
            }
        }
        // Users that are phis may have become trivial in turn
        for user in users {
            if sub.is_phi(user) && sub.instr_block(user).is_some() {
                self.remove_trivial_phi(sub, user)?;
            }
        }
        Ok(same)
    }

    /// Seals a basic block and completes (or removes as trivial) any
    /// provisional phis placed while it was unsealed.
    ///
    /// A block must not be sealed until every predecessor edge has been
    /// added. Sealing an already-sealed block is a no-op.
    pub fn add_sealed_block(&mut self, sub: &mut Subroutine, block: BlockId) -> RillResult<()> {
        let block_name = sub.block_name(block).to_string();
        if self.sealed_blocks.contains(&block_name) {
            return Ok(());
        }
        let pending = self.incomplete_phis.remove(&block_name).unwrap_or_default();
        for (name, phi) in pending {
            self.add_phi_operands(sub, &name, phi)?;
        }
        self.sealed_blocks.insert(block_name);
        Ok(())
    }
}
