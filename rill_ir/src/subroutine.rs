//! Subroutines and the instruction/block arenas they own
//!
//! A [`Subroutine`] owns two arenas: one for blocks, one for instructions.
//! Every cross-reference in the graph (use-def edges, CFG edges, branch
//! targets) is a stable id into those arenas, which keeps the mutable graph
//! free of cyclic ownership even across loop back-edges. Arena slots are
//! never reused: a removed instruction stays allocated but permanently
//! detached, so ids held by callers can never dangle.
//!
//! The mutation methods uphold the graph invariants after every call:
//! use-def symmetry, duplicate-free edge lists, symmetric pred/succ lists,
//! and `block.is_some()` exactly for listed instructions.

use crate::block::{BlockData, BlockId};
use crate::instr::{InstrData, InstrId, InstrKind, Operand, ValueDef};
use crate::types::{Binding, Op, Parameter, Type};
use hashbrown::HashMap;
use rill_common::{RillError, RillResult};
use serde::{Deserialize, Serialize};

/// The flavor of a subroutine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubroutineKind {
    /// A subroutine which returns a value
    Function { ret_type: Type },
    /// A subroutine which doesn't return a value
    Procedure,
    /// A forward declaration for a function
    FunctionForwardDecl { ret_type: Type },
    /// A forward declaration for a procedure
    ProcedureForwardDecl,
}

impl SubroutineKind {
    pub fn is_forward_decl(self) -> bool {
        matches!(
            self,
            SubroutineKind::FunctionForwardDecl { .. } | SubroutineKind::ProcedureForwardDecl
        )
    }

    pub fn ret_type(self) -> Option<Type> {
        match self {
            SubroutineKind::Function { ret_type }
            | SubroutineKind::FunctionForwardDecl { ret_type } => Some(ret_type),
            _ => None,
        }
    }
}

/// A subroutine: name, binding, parameters and the graph it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    name: String,
    binding: Binding,
    kind: SubroutineKind,
    params: Vec<Parameter>,
    blocks: Vec<BlockData>,
    block_order: Vec<BlockId>,
    block_names: HashMap<String, BlockId>,
    instrs: Vec<InstrData>,
}

impl Subroutine {
    fn new(
        name: impl Into<String>,
        params: Vec<Parameter>,
        binding: Binding,
        kind: SubroutineKind,
    ) -> Self {
        Self {
            name: name.into(),
            binding,
            kind,
            params,
            blocks: Vec::new(),
            block_order: Vec::new(),
            block_names: HashMap::new(),
            instrs: Vec::new(),
        }
    }

    pub fn function(
        name: impl Into<String>,
        params: Vec<Parameter>,
        ret_type: Type,
        binding: Binding,
    ) -> Self {
        Self::new(name, params, binding, SubroutineKind::Function { ret_type })
    }

    pub fn procedure(name: impl Into<String>, params: Vec<Parameter>, binding: Binding) -> Self {
        Self::new(name, params, binding, SubroutineKind::Procedure)
    }

    pub fn function_forward_decl(
        name: impl Into<String>,
        params: Vec<Parameter>,
        ret_type: Type,
        binding: Binding,
    ) -> Self {
        Self::new(name, params, binding, SubroutineKind::FunctionForwardDecl { ret_type })
    }

    pub fn procedure_forward_decl(
        name: impl Into<String>,
        params: Vec<Parameter>,
        binding: Binding,
    ) -> Self {
        Self::new(name, params, binding, SubroutineKind::ProcedureForwardDecl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn kind(&self) -> SubroutineKind {
        self.kind
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Adds a parameter to the subroutine
    pub fn add_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Removes a parameter from the subroutine
    pub fn remove_param(&mut self, name: &str) -> RillResult<Parameter> {
        let pos = self
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| RillError::missing_param(name))?;
        Ok(self.params.remove(pos))
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Adds a block to the subroutine. Block names are unique.
    pub fn add_block(&mut self, name: impl Into<String>) -> RillResult<BlockId> {
        let name = name.into();
        if self.block_names.contains_key(&name) {
            return Err(RillError::duplicate_block(name));
        }
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BlockData::new(name.clone()));
        self.block_order.push(id);
        self.block_names.insert(name, id);
        Ok(id)
    }

    /// Removes a block from the subroutine
    pub fn remove_block(&mut self, name: &str) -> RillResult<BlockId> {
        let id = self
            .block_names
            .remove(name)
            .ok_or_else(|| RillError::missing_block(name))?;
        self.block_order.retain(|&b| b != id);
        Ok(id)
    }

    /// The attached blocks, in insertion order
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.block_order.iter().copied()
    }

    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.index()]
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.block_names.get(name).copied()
    }

    pub fn block_name(&self, id: BlockId) -> &str {
        &self.blocks[id.index()].name
    }

    pub fn block_phis(&self, id: BlockId) -> &[InstrId] {
        &self.blocks[id.index()].phis
    }

    pub fn block_instrs(&self, id: BlockId) -> &[InstrId] {
        &self.blocks[id.index()].instrs
    }

    pub fn preds(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.index()].preds
    }

    pub fn succs(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.index()].succs
    }

    /// Adds a predecessor edge, transparently registering the reverse
    /// successor edge. Double insertions are ignored in both directions.
    pub fn add_pred(&mut self, block: BlockId, pred: BlockId) {
        let preds = &mut self.blocks[block.index()].preds;
        if !preds.contains(&pred) {
            preds.push(pred);
        }
        let succs = &mut self.blocks[pred.index()].succs;
        if !succs.contains(&block) {
            succs.push(block);
        }
    }

    /// Adds a successor edge, transparently registering the reverse
    /// predecessor edge
    pub fn add_succ(&mut self, block: BlockId, succ: BlockId) {
        self.add_pred(succ, block);
    }

    // ------------------------------------------------------------------
    // Instruction creation
    // ------------------------------------------------------------------

    fn alloc(&mut self, kind: InstrKind) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        self.instrs.push(InstrData::new(kind));
        id
    }

    /// Allocates a detached instruction and registers its use-def edges.
    /// Every value operand must refer to an assignment instruction.
    pub fn new_instr(&mut self, kind: InstrKind) -> RillResult<InstrId> {
        let opcode = kind.opcode_name();
        let operands = kind.value_operands();
        for &var in &operands {
            if !self.is_assignment(var) {
                return Err(RillError::MistypedOperand { opcode });
            }
        }
        let id = self.alloc(kind);
        for var in operands {
            self.add_used_var(id, var);
        }
        Ok(id)
    }

    pub fn new_const(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        value: impl Into<String>,
    ) -> InstrId {
        self.alloc(InstrKind::Const { def: ValueDef::new(name, ty), value: value.into() })
    }

    pub fn new_global_const(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        value: impl Into<String>,
        const_id: u64,
    ) -> InstrId {
        self.alloc(InstrKind::GlobalConst {
            def: ValueDef::new(name, ty),
            value: value.into(),
            const_id,
        })
    }

    pub fn new_binop(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        op: Op,
        x: InstrId,
        y: InstrId,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::BinOp { def: ValueDef::new(name, ty), op, x, y })
    }

    pub fn new_cast(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        value: InstrId,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::Cast { def: ValueDef::new(name, ty), value })
    }

    pub fn new_id(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        value: InstrId,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::Id { def: ValueDef::new(name, ty), value })
    }

    pub fn new_function_call(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        callee: impl Into<String>,
        args: Vec<InstrId>,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::FunctionCall {
            def: ValueDef::new(name, ty),
            callee: callee.into(),
            args,
        })
    }

    pub fn new_procedure_call(
        &mut self,
        callee: impl Into<String>,
        args: Vec<InstrId>,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::ProcedureCall { callee: callee.into(), args })
    }

    /// Creates an operandless phi; inputs are added with
    /// [`add_phi_input`](Self::add_phi_input)
    pub fn new_phi(&mut self, name: impl Into<String>, ty: Type) -> InstrId {
        self.alloc(InstrKind::Phi { def: ValueDef::new(name, ty), inputs: Vec::new() })
    }

    pub fn new_ubr(&mut self, target: BlockId) -> InstrId {
        self.alloc(InstrKind::Ubr { target })
    }

    pub fn new_cbr(
        &mut self,
        cond: InstrId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> RillResult<InstrId> {
        self.new_instr(InstrKind::Cbr { cond, then_block, else_block })
    }

    pub fn new_return(&mut self, ty: Type, value: InstrId) -> RillResult<InstrId> {
        self.new_instr(InstrKind::Return { ty, value })
    }

    // ------------------------------------------------------------------
    // Instruction queries
    // ------------------------------------------------------------------

    pub fn instr(&self, id: InstrId) -> &InstrData {
        &self.instrs[id.index()]
    }

    /// Every instruction ever allocated in the arena, attached or not
    pub fn instr_ids(&self) -> impl Iterator<Item = InstrId> + '_ {
        (0..self.instrs.len() as u32).map(InstrId)
    }

    pub fn instr_kind(&self, id: InstrId) -> &InstrKind {
        &self.instrs[id.index()].kind
    }

    pub fn instr_block(&self, id: InstrId) -> Option<BlockId> {
        self.instrs[id.index()].block
    }

    pub fn users(&self, id: InstrId) -> &[InstrId] {
        &self.instrs[id.index()].users
    }

    pub fn used_vars(&self, id: InstrId) -> &[InstrId] {
        &self.instrs[id.index()].used_vars
    }

    pub fn is_used(&self, id: InstrId) -> bool {
        self.instrs[id.index()].is_used()
    }

    pub fn use_count(&self, id: InstrId) -> usize {
        self.instrs[id.index()].use_count()
    }

    pub fn is_assignment(&self, id: InstrId) -> bool {
        self.instrs[id.index()].kind.is_assignment()
    }

    pub fn is_call(&self, id: InstrId) -> bool {
        self.instrs[id.index()].kind.is_call()
    }

    pub fn is_phi(&self, id: InstrId) -> bool {
        self.instrs[id.index()].kind.is_phi()
    }

    pub fn value_def(&self, id: InstrId) -> Option<&ValueDef> {
        self.instrs[id.index()].kind.def()
    }

    /// The base name of an assignment instruction
    pub fn var_name(&self, id: InstrId) -> Option<&str> {
        self.value_def(id).map(|d| d.name.as_str())
    }

    pub fn ssa_id(&self, id: InstrId) -> Option<u32> {
        self.value_def(id).and_then(|d| d.ssa_id)
    }

    pub fn set_ssa_id(&mut self, id: InstrId, ssa_id: u32) {
        if let Some(def) = self.instrs[id.index()].kind.def_mut() {
            def.ssa_id = Some(ssa_id);
        }
    }

    // ------------------------------------------------------------------
    // Uniform operand access
    // ------------------------------------------------------------------

    pub fn operand_count(&self, id: InstrId) -> usize {
        self.instrs[id.index()].kind.operand_count()
    }

    pub fn operand_at(&self, id: InstrId, idx: usize) -> RillResult<Operand> {
        let kind = &self.instrs[id.index()].kind;
        kind.operand_at(idx)
            .ok_or(RillError::OperandIndex { opcode: kind.opcode_name(), index: idx })
    }

    /// Sets the operand at `idx`. Value slots are rewired through
    /// [`replace_use`](Self::replace_use); payload slots are assigned
    /// directly. The new operand must match the slot's kind.
    pub fn set_operand_at(&mut self, id: InstrId, idx: usize, new: Operand) -> RillResult<()> {
        let opcode = self.instrs[id.index()].kind.opcode_name();
        let current = self
            .instrs[id.index()]
            .kind
            .operand_at(idx)
            .ok_or(RillError::OperandIndex { opcode, index: idx })?;
        match (current, new) {
            (Operand::Value(old), Operand::Value(new)) => self.replace_use(id, old, new),
            (Operand::Opcode(_), Operand::Opcode(op)) => {
                if let InstrKind::BinOp { op: slot, .. } = &mut self.instrs[id.index()].kind {
                    *slot = op;
                }
                Ok(())
            }
            (Operand::Literal(_), Operand::Literal(value)) => {
                match &mut self.instrs[id.index()].kind {
                    InstrKind::Const { value: slot, .. }
                    | InstrKind::GlobalConst { value: slot, .. } => *slot = value,
                    _ => unreachable!("literal slot on a non-const"),
                }
                Ok(())
            }
            (Operand::Callee(_), Operand::Callee(callee)) => {
                match &mut self.instrs[id.index()].kind {
                    InstrKind::FunctionCall { callee: slot, .. }
                    | InstrKind::ProcedureCall { callee: slot, .. } => *slot = callee,
                    _ => unreachable!("callee slot on a non-call"),
                }
                Ok(())
            }
            (Operand::Block(_), Operand::Block(target)) => {
                match (&mut self.instrs[id.index()].kind, idx) {
                    (InstrKind::Ubr { target: slot }, 0) => *slot = target,
                    (InstrKind::Cbr { then_block: slot, .. }, 1) => *slot = target,
                    (InstrKind::Cbr { else_block: slot, .. }, 2) => *slot = target,
                    _ => unreachable!("block slot mismatch"),
                }
                Ok(())
            }
            _ => Err(RillError::MistypedOperand { opcode }),
        }
    }

    // ------------------------------------------------------------------
    // Use-def maintenance
    // ------------------------------------------------------------------

    /// Adds `user` to `id`'s users list. Duplicates are ignored.
    pub fn add_user(&mut self, id: InstrId, user: InstrId) {
        let users = &mut self.instrs[id.index()].users;
        if !users.contains(&user) {
            users.push(user);
        }
    }

    /// Removes `user` from `id`'s users list
    pub fn remove_user(&mut self, id: InstrId, user: InstrId) -> RillResult<()> {
        let users = &mut self.instrs[id.index()].users;
        let pos = users.iter().position(|&u| u == user).ok_or(RillError::NotAUser)?;
        users.remove(pos);
        Ok(())
    }

    /// Records that `user` reads `var`, keeping both directions in sync
    fn add_used_var(&mut self, user: InstrId, var: InstrId) {
        let used = &mut self.instrs[user.index()].used_vars;
        if !used.contains(&var) {
            used.push(var);
        }
        self.add_user(var, user);
    }

    /// Forgets that `user` reads `var`, keeping both directions in sync
    fn remove_used_var(&mut self, user: InstrId, var: InstrId) -> RillResult<()> {
        let used = &mut self.instrs[user.index()].used_vars;
        let pos = used.iter().position(|&v| v == var).ok_or(RillError::NotAUsedVar)?;
        used.remove(pos);
        self.remove_user(var, user)
    }

    /// Replaces every use of `old` within `user` with `new`, updating the
    /// typed operand fields along with the bookkeeping. Every occurrence of
    /// `old` in the operand list is rewritten.
    pub fn replace_use(&mut self, user: InstrId, old: InstrId, new: InstrId) -> RillResult<()> {
        let opcode = self.instrs[user.index()].kind.opcode_name();
        if !self.is_assignment(new) {
            return Err(RillError::MistypedOperand { opcode });
        }
        match &self.instrs[user.index()].kind {
            InstrKind::Const { .. } | InstrKind::GlobalConst { .. } | InstrKind::Ubr { .. } => {
                return Err(RillError::UnsupportedOperand { opcode });
            }
            _ => {}
        }
        if !self.instrs[user.index()].used_vars.contains(&old) {
            return Err(RillError::NotAUsedVar);
        }
        self.remove_used_var(user, old)?;
        self.add_used_var(user, new);
        match &mut self.instrs[user.index()].kind {
            InstrKind::BinOp { x, y, .. } => {
                if *x == old {
                    *x = new;
                }
                if *y == old {
                    *y = new;
                }
            }
            InstrKind::Cast { value, .. }
            | InstrKind::Id { value, .. }
            | InstrKind::Return { value, .. } => {
                if *value == old {
                    *value = new;
                }
            }
            InstrKind::Cbr { cond, .. } => {
                if *cond == old {
                    *cond = new;
                }
            }
            InstrKind::FunctionCall { args, .. } | InstrKind::ProcedureCall { args, .. } => {
                for arg in args.iter_mut() {
                    if *arg == old {
                        *arg = new;
                    }
                }
            }
            InstrKind::Phi { inputs, .. } => {
                for input in inputs.iter_mut() {
                    if *input == old {
                        *input = new;
                    }
                }
            }
            _ => unreachable!("operandless variants were rejected above"),
        }
        Ok(())
    }

    /// Redirects every current user of `old` to read `new` instead, then
    /// detaches `old` from the variables it uses
    pub fn replace_by(&mut self, old: InstrId, new: InstrId) -> RillResult<()> {
        let users: Vec<InstrId> = self.instrs[old.index()].users.to_vec();
        for user in users {
            self.replace_use(user, old, new)?;
        }
        let used: Vec<InstrId> = self.instrs[old.index()].used_vars.to_vec();
        for var in used {
            self.remove_used_var(old, var)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attaching, replacing and removing instructions
    // ------------------------------------------------------------------

    /// Adds a non-phi instruction to the end of a block. To add a phi
    /// instruction, look to [`add_phi_instr`](Self::add_phi_instr).
    pub fn add_instr(&mut self, block: BlockId, instr: InstrId) -> RillResult<InstrId> {
        if self.is_phi(instr) {
            return Err(RillError::UnexpectedPhi);
        }
        self.attach(block, instr)?;
        self.blocks[block.index()].instrs.push(instr);
        Ok(instr)
    }

    /// Adds a phi instruction to a block's phi list
    pub fn add_phi_instr(&mut self, block: BlockId, phi: InstrId) -> RillResult<InstrId> {
        if !self.is_phi(phi) {
            return Err(RillError::ExpectedPhi);
        }
        self.attach(block, phi)?;
        self.blocks[block.index()].phis.push(phi);
        Ok(phi)
    }

    /// Inserts a non-phi instruction at a specific point in the block.
    /// Remember that this has a worst case of O(n).
    pub fn insert_instr(&mut self, block: BlockId, loc: usize, instr: InstrId) -> RillResult<InstrId> {
        if self.is_phi(instr) {
            return Err(RillError::UnexpectedPhi);
        }
        self.attach(block, instr)?;
        let instrs = &mut self.blocks[block.index()].instrs;
        let loc = loc.min(instrs.len());
        instrs.insert(loc, instr);
        Ok(instr)
    }

    fn attach(&mut self, block: BlockId, instr: InstrId) -> RillResult<()> {
        if self.instrs[instr.index()].block.is_some() {
            return Err(RillError::InstrAttached);
        }
        self.instrs[instr.index()].block = Some(block);
        Ok(())
    }

    /// Replaces an existing instruction with a detached, unused one. The
    /// replacement takes over the old instruction's position and users.
    pub fn replace_instr(&mut self, block: BlockId, old: InstrId, new: InstrId) -> RillResult<()> {
        let pos = self.blocks[block.index()]
            .instrs
            .iter()
            .position(|&i| i == old)
            .ok_or(RillError::MissingInstr)?;
        if self.is_used(new) {
            return Err(RillError::used_removal(self.describe(new)));
        }
        if self.instrs[new.index()].block.is_some() {
            return Err(RillError::InstrAttached);
        }
        self.instrs[new.index()].block = Some(block);
        self.blocks[block.index()].instrs.insert(pos, new);
        self.replace_by(old, new)?;
        self.blocks[block.index()].instrs.retain(|&i| i != old);
        self.instrs[old.index()].block = None;
        Ok(())
    }

    /// Removes an existing instruction. The instruction must not be used.
    pub fn remove_instr(&mut self, instr: InstrId) -> RillResult<()> {
        let block = self.instr_block(instr).ok_or(RillError::MissingInstr)?;
        let pos = self.blocks[block.index()]
            .instrs
            .iter()
            .position(|&i| i == instr)
            .ok_or(RillError::MissingInstr)?;
        if self.is_used(instr) {
            return Err(RillError::used_removal(self.describe(instr)));
        }
        self.instrs[instr.index()].block = None;
        let used: Vec<InstrId> = self.instrs[instr.index()].used_vars.to_vec();
        for var in used {
            self.remove_used_var(instr, var)?;
        }
        self.blocks[block.index()].instrs.remove(pos);
        Ok(())
    }

    /// Removes an existing phi instruction. The phi must not be used.
    pub fn remove_phi_instr(&mut self, phi: InstrId) -> RillResult<()> {
        let block = self.instr_block(phi).ok_or(RillError::MissingInstr)?;
        let pos = self.blocks[block.index()]
            .phis
            .iter()
            .position(|&i| i == phi)
            .ok_or(RillError::MissingInstr)?;
        if self.is_used(phi) {
            return Err(RillError::used_removal(self.describe(phi)));
        }
        self.instrs[phi.index()].block = None;
        let used: Vec<InstrId> = self.instrs[phi.index()].used_vars.to_vec();
        for var in used {
            self.remove_used_var(phi, var)?;
        }
        self.blocks[block.index()].phis.remove(pos);
        Ok(())
    }

    /// Unlinks a phi from its block's phi list without touching its edges.
    /// Used by trivial-phi rewriting, where the phi still has users that are
    /// about to be redirected.
    pub(crate) fn detach_phi(&mut self, phi: InstrId) -> RillResult<()> {
        let block = self.instr_block(phi).ok_or(RillError::MissingInstr)?;
        let pos = self.blocks[block.index()]
            .phis
            .iter()
            .position(|&i| i == phi)
            .ok_or(RillError::MissingInstr)?;
        self.blocks[block.index()].phis.remove(pos);
        self.instrs[phi.index()].block = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phi inputs and call arguments
    // ------------------------------------------------------------------

    /// Adds an input to a phi function. The input's defining instruction
    /// must already be attached to a block.
    pub fn add_phi_input(&mut self, phi: InstrId, value: InstrId) -> RillResult<()> {
        if !self.is_phi(phi) {
            return Err(RillError::ExpectedPhi);
        }
        if !self.is_assignment(value) {
            return Err(RillError::MistypedOperand { opcode: "phi" });
        }
        if self.instr_block(value).is_none() {
            return Err(RillError::UnattachedPhiInput);
        }
        if let InstrKind::Phi { inputs, .. } = &mut self.instrs[phi.index()].kind {
            inputs.push(value);
        }
        self.add_used_var(phi, value);
        Ok(())
    }

    /// Removes one occurrence of an input from a phi function
    pub fn remove_phi_input(&mut self, phi: InstrId, value: InstrId) -> RillResult<()> {
        let remaining = match &mut self.instrs[phi.index()].kind {
            InstrKind::Phi { inputs, .. } => {
                let pos = inputs
                    .iter()
                    .position(|&i| i == value)
                    .ok_or(RillError::MissingInstr)?;
                inputs.remove(pos);
                inputs.contains(&value)
            }
            _ => return Err(RillError::ExpectedPhi),
        };
        // Keep the use-def edge while another occurrence of the input remains
        if !remaining {
            self.remove_used_var(phi, value)?;
        }
        Ok(())
    }

    /// Adds an argument to a call instruction's parameter list
    pub fn add_call_arg(&mut self, call: InstrId, arg: InstrId) -> RillResult<()> {
        let opcode = self.instrs[call.index()].kind.opcode_name();
        if !self.is_assignment(arg) {
            return Err(RillError::MistypedOperand { opcode });
        }
        match &mut self.instrs[call.index()].kind {
            InstrKind::FunctionCall { args, .. } | InstrKind::ProcedureCall { args, .. } => {
                args.push(arg);
            }
            _ => return Err(RillError::UnsupportedOperand { opcode }),
        }
        self.add_used_var(call, arg);
        Ok(())
    }

    /// Removes one occurrence of an argument from a call instruction
    pub fn remove_call_arg(&mut self, call: InstrId, arg: InstrId) -> RillResult<()> {
        let opcode = self.instrs[call.index()].kind.opcode_name();
        let arg_name = self.describe(arg);
        let remaining = match &mut self.instrs[call.index()].kind {
            InstrKind::FunctionCall { args, .. } | InstrKind::ProcedureCall { args, .. } => {
                let pos = args
                    .iter()
                    .position(|&a| a == arg)
                    .ok_or_else(|| RillError::missing_param(arg_name))?;
                args.remove(pos);
                args.contains(&arg)
            }
            _ => return Err(RillError::UnsupportedOperand { opcode }),
        };
        if !remaining {
            self.remove_used_var(call, arg)?;
        }
        Ok(())
    }

    /// A short human-readable tag for error messages
    fn describe(&self, id: InstrId) -> String {
        match self.instrs[id.index()].kind.def() {
            Some(def) => def.name.clone(),
            None => self.instrs[id.index()].kind.opcode_name().to_string(),
        }
    }
}
