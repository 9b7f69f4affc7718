//! Local value numbering
//!
//! Runs on every basic block, removing common subexpressions while
//! simultaneously propagating copies and constants. Instructions are
//! fingerprinted by opcode, result type and operand value numbers; a
//! commutative binary operation gets a canonicalized operand order so
//! `a + b` and `b + a` collapse together. Constant folding runs first, so
//! folded results take part in the numbering. Afterwards dead instruction
//! elimination cleans up what the rewrites left behind.

use crate::dia::Dia;
use crate::fold::fold_instr;
use crate::manager::BlockPass;
use hashbrown::HashMap;
use log::debug;
use rill_common::RillResult;
use rill_ir::{BlockId, InstrId, InstrKind, Op, Operand, Subroutine, Type};

/// The SSA variable identity of an assignment instruction
type VarKey = (String, Option<u32>);

/// One operand of a value fingerprint: a block-local value number when one
/// exists, otherwise the operand's own identity or payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueParam {
    Number(u64),
    Variable(String, Option<u32>),
    Opcode(Op),
    Literal(String),
    Callee(String),
}

/// Fingerprints an assignment instruction for the value table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Value {
    opcode: &'static str,
    ty: Type,
    params: Vec<ValueParam>,
}

/// The local value numbering optimization pass
#[derive(Default)]
pub struct Lvn {
    num_count: u64,
    dia: Dia,
}

impl Lvn {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_num(&mut self) -> u64 {
        let num = self.num_count;
        self.num_count += 1;
        num
    }

    fn var_key(sub: &Subroutine, id: InstrId) -> VarKey {
        match sub.value_def(id) {
            Some(def) => (def.name.clone(), def.ssa_id),
            None => (String::new(), None),
        }
    }

    /// Builds the fingerprint of an assignment instruction. Operands defined
    /// in this block appear as their value numbers; anything else (values
    /// from other blocks, phi results, call results) appears as its variable
    /// identity.
    fn fingerprint(
        sub: &Subroutine,
        instr: InstrId,
        numberings: &HashMap<VarKey, u64>,
    ) -> Value {
        let kind = sub.instr_kind(instr);
        let mut params = Vec::new();
        for idx in 0..kind.operand_count() {
            let param = match kind.operand_at(idx) {
                Some(Operand::Value(operand)) => {
                    let key = Self::var_key(sub, operand);
                    match numberings.get(&key) {
                        Some(&number) if !sub.is_call(operand) => ValueParam::Number(number),
                        _ => ValueParam::Variable(key.0, key.1),
                    }
                }
                Some(Operand::Opcode(op)) => ValueParam::Opcode(op),
                Some(Operand::Literal(value)) => ValueParam::Literal(value),
                Some(Operand::Callee(callee)) => ValueParam::Callee(callee),
                Some(Operand::Block(_)) | None => continue,
            };
            params.push(param);
        }
        let commutative = matches!(kind, InstrKind::BinOp { op, .. } if op.is_commutative());
        if commutative {
            params.sort_by_key(|param| format!("{:?}", param));
        }
        let ty = kind.def().map(|def| def.ty).unwrap_or(Type::Void);
        Value { opcode: kind.opcode_name(), ty, params }
    }

    /// Rewrites every operand that has a local number to point at the
    /// canonical instruction registered under that number
    fn redirect_operands(
        sub: &mut Subroutine,
        instr: InstrId,
        numberings: &HashMap<VarKey, u64>,
        names: &HashMap<u64, InstrId>,
    ) -> RillResult<()> {
        for idx in 0..sub.operand_count(instr) {
            if let Ok(Operand::Value(operand)) = sub.operand_at(instr, idx) {
                let key = Self::var_key(sub, operand);
                if let Some(canonical) = numberings.get(&key).and_then(|n| names.get(n)) {
                    sub.set_operand_at(instr, idx, Operand::Value(*canonical))?;
                }
            }
        }
        Ok(())
    }
}

impl BlockPass for Lvn {
    fn run_pass(&mut self, sub: &mut Subroutine, block: BlockId) -> RillResult<()> {
        // (name, ssa_id) -> value number
        let mut numberings: HashMap<VarKey, u64> = HashMap::new();
        // fingerprint -> value number
        let mut value_table: HashMap<Value, u64> = HashMap::new();
        // value number -> canonical defining instruction
        let mut names: HashMap<u64, InstrId> = HashMap::new();

        let mut idx = 0;
        while idx < sub.block_instrs(block).len() {
            let mut instr = sub.block_instrs(block)[idx];
            idx += 1;
            if !sub.is_assignment(instr) {
                continue;
            }
            if let Some(folded_kind) = fold_instr(sub, instr) {
                // The instruction folds into a constant; swap it in place
                // and continue with the constant
                let folded = sub.new_instr(folded_kind)?;
                sub.replace_instr(block, instr, folded)?;
                debug!("folded {:?} into {}", instr, sub.instr_to_string(folded));
                instr = folded;
            }
            let key = Self::var_key(sub, instr);
            if sub.is_call(instr) {
                // Calls may have side effects: they get a number so later
                // operands can refer to them, but they never match (or
                // populate) the value table
                let number = self.fresh_num();
                names.insert(number, instr);
                Self::redirect_operands(sub, instr, &numberings, &names)?;
                numberings.insert(key, number);
                continue;
            }
            let value = Self::fingerprint(sub, instr, &numberings);
            if let Some(&number) = value_table.get(&value) {
                // An identical computation already exists: replace the
                // instruction with a copy of the canonical one
                let canonical = names[&number];
                if let Some(def) = sub.value_def(instr).cloned() {
                    let copy = sub.new_id(def.name, def.ty, canonical)?;
                    if let Some(ssa_id) = def.ssa_id {
                        sub.set_ssa_id(copy, ssa_id);
                    }
                    sub.replace_instr(block, instr, copy)?;
                    debug!("collapsed {:?} into {}", instr, sub.instr_to_string(copy));
                }
                numberings.insert(key, number);
            } else {
                // A copy joins its source's equivalence class instead of
                // starting one of its own; everything else gets a fresh
                // number and becomes the canonical name for it
                let number = match (sub.instr_kind(instr), value.params.first()) {
                    (InstrKind::Id { .. }, Some(&ValueParam::Number(number))) => number,
                    _ => {
                        let number = self.fresh_num();
                        names.insert(number, instr);
                        number
                    }
                };
                value_table.insert(value, number);
                Self::redirect_operands(sub, instr, &numberings, &names)?;
                numberings.insert(key, number);
            }
        }
        // Clean up operands orphaned by the rewrites
        self.dia.run_pass(sub, block)
    }
}
