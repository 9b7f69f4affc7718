//! Text rendering of the IR
//!
//! The output is deterministic and compared byte-for-byte by the golden
//! tests: `module <name>` header, subroutine headers with binding sigils,
//! `.block:` labels, 4-space indentation, phis grouped before the other
//! instructions.

use crate::block::BlockId;
use crate::instr::{InstrId, InstrKind};
use crate::module::Module;
use crate::subroutine::{Subroutine, SubroutineKind};
use rill_common::PrettyPrinter;
use std::fmt;

impl Subroutine {
    /// Renders `%name.ssa` for an assignment instruction
    fn value_ref(&self, id: InstrId) -> String {
        match self.value_def(id) {
            Some(def) => match def.ssa_id {
                Some(ssa) => format!("%{}.{}", def.name, ssa),
                None => format!("%{}.?", def.name),
            },
            None => "%?".to_string(),
        }
    }

    fn block_label(&self, id: BlockId) -> String {
        format!(".{}", self.block_name(id))
    }

    /// Renders one instruction in the text form
    pub fn instr_to_string(&self, id: InstrId) -> String {
        let prefix = |def: &crate::instr::ValueDef| {
            format!("{}: {} = ", self.value_ref(id), def.ty)
        };
        match self.instr_kind(id) {
            InstrKind::Const { def, value } => {
                format!("{}const {}", prefix(def), value)
            }
            InstrKind::GlobalConst { def, value, .. } => {
                format!("{}gconst {}", prefix(def), value)
            }
            InstrKind::BinOp { def, op, x, y } => {
                format!("{}{} {} {}", prefix(def), op, self.value_ref(*x), self.value_ref(*y))
            }
            InstrKind::Cast { def, value } => {
                format!("{}cast {}", prefix(def), self.value_ref(*value))
            }
            InstrKind::Id { def, value } => {
                format!("{}id {}", prefix(def), self.value_ref(*value))
            }
            InstrKind::FunctionCall { def, callee, args } => {
                let args: Vec<String> = args.iter().map(|&a| self.value_ref(a)).collect();
                format!("{}fcall {}({})", prefix(def), callee, args.join(", "))
            }
            InstrKind::ProcedureCall { callee, args } => {
                let args: Vec<String> = args.iter().map(|&a| self.value_ref(a)).collect();
                format!("pcall {}({})", callee, args.join(", "))
            }
            InstrKind::Phi { def, inputs } => {
                let inputs: Vec<String> = inputs
                    .iter()
                    .map(|&input| {
                        let label = match self.instr_block(input) {
                            Some(block) => self.block_label(block),
                            None => ".?".to_string(),
                        };
                        format!("({}, {})", label, self.value_ref(input))
                    })
                    .collect();
                format!("{}phi({})", prefix(def), inputs.join(", "))
            }
            InstrKind::Ubr { target } => {
                format!("ubr {}", self.block_label(*target))
            }
            InstrKind::Cbr { cond, then_block, else_block } => {
                format!(
                    "cbr {} {} {}",
                    self.value_ref(*cond),
                    self.block_label(*then_block),
                    self.block_label(*else_block)
                )
            }
            InstrKind::Return { value, .. } => {
                format!("return {}", self.value_ref(*value))
            }
        }
    }

    fn block_to_string(&self, id: BlockId) -> String {
        let mut pp = PrettyPrinter::new();
        pp.appendln(&format!("{}:", self.block_label(id)));
        pp.indented(|pp| {
            for &phi in self.block_phis(id) {
                pp.appendln(&self.instr_to_string(phi));
            }
            for &instr in self.block_instrs(id) {
                pp.appendln(&self.instr_to_string(instr));
            }
        });
        pp.finish()
    }

    fn params_to_string(&self) -> String {
        let params: Vec<String> = self.params().iter().map(|p| p.to_string()).collect();
        params.join(", ")
    }

    fn body_to_string(&self) -> String {
        let blocks: Vec<String> = self.blocks().map(|b| self.block_to_string(b)).collect();
        blocks.join("\n")
    }
}

impl fmt::Display for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sigil = self.binding().sigil();
        match self.kind() {
            SubroutineKind::Function { ret_type } => write!(
                f,
                "function {} {}{}({}) {{\n{}}}",
                ret_type,
                sigil,
                self.name(),
                self.params_to_string(),
                self.body_to_string()
            ),
            SubroutineKind::Procedure => write!(
                f,
                "procedure {}{}({}) {{\n{}}}",
                sigil,
                self.name(),
                self.params_to_string(),
                self.body_to_string()
            ),
            SubroutineKind::FunctionForwardDecl { ret_type } => write!(
                f,
                "function {} {}{}({})",
                ret_type,
                sigil,
                self.name(),
                self.params_to_string()
            ),
            SubroutineKind::ProcedureForwardDecl => write!(
                f,
                "procedure {}{}({})",
                sigil,
                self.name(),
                self.params_to_string()
            ),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.name)?;
        writeln!(f)?;
        for subroutine in self.subroutines() {
            writeln!(f, "{}", subroutine)?;
        }
        Ok(())
    }
}
