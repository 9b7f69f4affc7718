//! Optimization passes for the Rill compiler
//!
//! Features:
//! - A pass manager dispatching module, subroutine, block and instruction
//!   level passes in registration order
//! - Local value numbering with copy/constant propagation
//! - Wrap-correct constant folding over fixed-width integer arithmetic
//! - Recursive dead instruction elimination

pub mod dia;
pub mod fold;
pub mod lvn;
pub mod manager;

pub use dia::Dia;
pub use fold::fold_instr;
pub use lvn::Lvn;
pub use manager::{BlockPass, InstructionPass, ModulePass, PassManager, SubroutinePass};
