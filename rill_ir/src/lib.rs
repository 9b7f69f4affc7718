//! SSA intermediate representation for the Rill compiler
//!
//! Features:
//! - A typed, mutable IR graph (modules, subroutines, blocks, instructions)
//!   with bidirectionally maintained use-def edges
//! - Incremental pruned-SSA construction with lazy phi placement over
//!   incomplete control-flow graphs
//! - Deterministic text rendering for debugging and golden tests

pub mod block;
pub mod instr;
pub mod module;
pub mod printer;
pub mod ssa;
pub mod subroutine;
pub mod types;

pub use block::{BlockData, BlockId};
pub use instr::{InstrData, InstrId, InstrKind, Operand, ValueDef};
pub use module::Module;
pub use ssa::SsaBuilder;
pub use subroutine::{Subroutine, SubroutineKind};
pub use types::{Binding, Op, Parameter, Type};
