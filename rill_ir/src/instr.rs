//! Instruction definitions for the Rill IR
//!
//! Instructions live in an arena owned by their [`Subroutine`](crate::Subroutine)
//! and refer to each other through stable [`InstrId`]s. The variants are a
//! closed tagged union; uniform operand access dispatches on the discriminator.

use crate::block::BlockId;
use crate::types::{Op, Type};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable identifier of an instruction within its subroutine's arena
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InstrId(pub(crate) u32);

impl InstrId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The result slot of an assignment-producing instruction
///
/// The pair `(name, ssa_id)` is the globally unique SSA variable identifier
/// once construction completes. `ssa_id` stays `None` until the builder
/// registers the instruction with `new_variable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDef {
    pub name: String,
    pub ty: Type,
    pub ssa_id: Option<u32>,
}

impl ValueDef {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, ssa_id: None }
    }
}

/// A single operand slot of an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A reference to an assignment instruction
    Value(InstrId),
    /// The operation of a binary instruction
    Opcode(Op),
    /// A literal payload (constant value)
    Literal(String),
    /// The callee of a call instruction
    Callee(String),
    /// A branch target
    Block(BlockId),
}

/// The instruction variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrKind {
    /// A constant value (ie. 3, 3.14, etc)
    Const { def: ValueDef, value: String },
    /// A global constant; can not be set after it is defined
    GlobalConst { def: ValueDef, value: String, const_id: u64 },
    /// A binary operation of the form `op x y`
    BinOp { def: ValueDef, op: Op, x: InstrId, y: InstrId },
    /// A conversion from one type to another
    Cast { def: ValueDef, value: InstrId },
    /// A copy operation of the form `x = y`
    Id { def: ValueDef, value: InstrId },
    /// An instruction that invokes a function and yields its result
    FunctionCall { def: ValueDef, callee: String, args: Vec<InstrId> },
    /// An instruction that invokes a procedure
    ProcedureCall { callee: String, args: Vec<InstrId> },
    /// Merges values based upon the block's predecessors. If a block has
    /// more than one phi instruction, all of them execute simultaneously.
    Phi { def: ValueDef, inputs: Vec<InstrId> },
    /// An unconditional branch to another block
    Ubr { target: BlockId },
    /// A conditional branch
    Cbr { cond: InstrId, then_block: BlockId, else_block: BlockId },
    /// Returns control (and possibly a value) back to the caller
    Return { ty: Type, value: InstrId },
}

impl InstrKind {
    /// The lowercase opcode used in the text form
    pub fn opcode_name(&self) -> &'static str {
        match self {
            InstrKind::Const { .. } => "const",
            InstrKind::GlobalConst { .. } => "gconst",
            InstrKind::BinOp { op, .. } => op.name(),
            InstrKind::Cast { .. } => "cast",
            InstrKind::Id { .. } => "id",
            InstrKind::FunctionCall { .. } => "fcall",
            InstrKind::ProcedureCall { .. } => "pcall",
            InstrKind::Phi { .. } => "phi",
            InstrKind::Ubr { .. } => "ubr",
            InstrKind::Cbr { .. } => "cbr",
            InstrKind::Return { .. } => "return",
        }
    }

    /// True if the instruction yields a named SSA value
    pub fn is_assignment(&self) -> bool {
        self.def().is_some()
    }

    /// True for instructions that invoke a subroutine
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            InstrKind::FunctionCall { .. } | InstrKind::ProcedureCall { .. }
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstrKind::Phi { .. })
    }

    /// The result slot, for assignment-producing variants
    pub fn def(&self) -> Option<&ValueDef> {
        match self {
            InstrKind::Const { def, .. }
            | InstrKind::GlobalConst { def, .. }
            | InstrKind::BinOp { def, .. }
            | InstrKind::Cast { def, .. }
            | InstrKind::Id { def, .. }
            | InstrKind::FunctionCall { def, .. }
            | InstrKind::Phi { def, .. } => Some(def),
            _ => None,
        }
    }

    pub fn def_mut(&mut self) -> Option<&mut ValueDef> {
        match self {
            InstrKind::Const { def, .. }
            | InstrKind::GlobalConst { def, .. }
            | InstrKind::BinOp { def, .. }
            | InstrKind::Cast { def, .. }
            | InstrKind::Id { def, .. }
            | InstrKind::FunctionCall { def, .. }
            | InstrKind::Phi { def, .. } => Some(def),
            _ => None,
        }
    }

    /// The assignment instructions this instruction reads, in operand order
    pub fn value_operands(&self) -> Vec<InstrId> {
        match self {
            InstrKind::Const { .. } | InstrKind::GlobalConst { .. } | InstrKind::Ubr { .. } => {
                Vec::new()
            }
            InstrKind::BinOp { x, y, .. } => vec![*x, *y],
            InstrKind::Cast { value, .. } | InstrKind::Id { value, .. } => vec![*value],
            InstrKind::FunctionCall { args, .. } | InstrKind::ProcedureCall { args, .. } => {
                args.clone()
            }
            InstrKind::Phi { inputs, .. } => inputs.clone(),
            InstrKind::Cbr { cond, .. } => vec![*cond],
            InstrKind::Return { value, .. } => vec![*value],
        }
    }

    /// The number of operands the instruction has
    pub fn operand_count(&self) -> usize {
        match self {
            InstrKind::Const { .. } | InstrKind::GlobalConst { .. } => 1,
            InstrKind::BinOp { .. } => 3,
            InstrKind::Cast { .. } | InstrKind::Id { .. } => 1,
            InstrKind::FunctionCall { args, .. } | InstrKind::ProcedureCall { args, .. } => {
                args.len() + 1
            }
            InstrKind::Phi { inputs, .. } => inputs.len(),
            InstrKind::Ubr { .. } => 1,
            InstrKind::Cbr { .. } => 3,
            InstrKind::Return { .. } => 1,
        }
    }

    /// The operand at `idx`, following the per-variant layout:
    /// `Const (value)`, `BinOp (op, x, y)`, `Cast (value)`, `Id (value)`,
    /// calls `(callee, args…)`, `Phi (inputs…)`, `Ubr (target)`,
    /// `Cbr (cond, then, else)`, `Return (value)`
    pub fn operand_at(&self, idx: usize) -> Option<Operand> {
        let operand = match (self, idx) {
            (InstrKind::Const { value, .. }, 0) => Operand::Literal(value.clone()),
            (InstrKind::GlobalConst { value, .. }, 0) => Operand::Literal(value.clone()),
            (InstrKind::BinOp { op, .. }, 0) => Operand::Opcode(*op),
            (InstrKind::BinOp { x, .. }, 1) => Operand::Value(*x),
            (InstrKind::BinOp { y, .. }, 2) => Operand::Value(*y),
            (InstrKind::Cast { value, .. }, 0) | (InstrKind::Id { value, .. }, 0) => {
                Operand::Value(*value)
            }
            (InstrKind::FunctionCall { callee, .. }, 0)
            | (InstrKind::ProcedureCall { callee, .. }, 0) => Operand::Callee(callee.clone()),
            (InstrKind::FunctionCall { args, .. }, _)
            | (InstrKind::ProcedureCall { args, .. }, _) => {
                Operand::Value(*args.get(idx - 1)?)
            }
            (InstrKind::Phi { inputs, .. }, _) => Operand::Value(*inputs.get(idx)?),
            (InstrKind::Ubr { target }, 0) => Operand::Block(*target),
            (InstrKind::Cbr { cond, .. }, 0) => Operand::Value(*cond),
            (InstrKind::Cbr { then_block, .. }, 1) => Operand::Block(*then_block),
            (InstrKind::Cbr { else_block, .. }, 2) => Operand::Block(*else_block),
            (InstrKind::Return { value, .. }, 0) => Operand::Value(*value),
            _ => return None,
        };
        Some(operand)
    }
}

/// An arena slot: the instruction plus its graph bookkeeping
///
/// `users` and `used_vars` are kept symmetric and duplicate-free by the
/// subroutine's mutation methods; `block` is `Some` exactly while the
/// instruction is listed in that block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrData {
    pub(crate) kind: InstrKind,
    pub(crate) block: Option<BlockId>,
    pub(crate) users: SmallVec<[InstrId; 4]>,
    pub(crate) used_vars: SmallVec<[InstrId; 4]>,
}

impl InstrData {
    pub(crate) fn new(kind: InstrKind) -> Self {
        Self {
            kind,
            block: None,
            users: SmallVec::new(),
            used_vars: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> &InstrKind {
        &self.kind
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    pub fn users(&self) -> &[InstrId] {
        &self.users
    }

    pub fn used_vars(&self) -> &[InstrId] {
        &self.used_vars
    }

    pub fn is_used(&self) -> bool {
        !self.users.is_empty()
    }

    pub fn use_count(&self) -> usize {
        self.users.len()
    }
}
