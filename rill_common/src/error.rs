//! Error handling utilities for the Rill compiler
//!
//! Every variant here is a contract violation: the IR builder and the passes
//! expect well-formed incremental construction, and none of these conditions
//! is recoverable at runtime.

use thiserror::Error;

/// The main error type for the Rill compiler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RillError {
    #[error("redefinition of block `{name}`")]
    DuplicateBlock { name: String },

    #[error("block `{name}` does not exist")]
    MissingBlock { name: String },

    #[error("instruction is not in the relevant instruction list")]
    MissingInstr,

    #[error("instruction `{name}` is still used; it is not safe to remove it")]
    UsedRemoval { name: String },

    #[error("operand of `{opcode}` must be an assignment instruction")]
    MistypedOperand { opcode: &'static str },

    #[error("instruction is not a registered user")]
    NotAUser,

    #[error("instruction is not a registered used variable")]
    NotAUsedVar,

    #[error("phi input must be assigned a block before it is added")]
    UnattachedPhiInput,

    #[error("expected a phi instruction")]
    ExpectedPhi,

    #[error("phi instructions must be added with `add_phi_instr`")]
    UnexpectedPhi,

    #[error("`{opcode}` does not use any variables; invalid call to `replace_use`")]
    UnsupportedOperand { opcode: &'static str },

    #[error("operand index {index} out of range for `{opcode}`")]
    OperandIndex { opcode: &'static str, index: usize },

    #[error("instruction is already attached to a block")]
    InstrAttached,

    #[error("parameter `{name}` not found")]
    MissingParam { name: String },

    #[error("no reaching definition for variable `{name}`")]
    UndefinedVariable { name: String },
}

/// Result type alias for Rill compiler operations
pub type RillResult<T> = Result<T, RillError>;

impl RillError {
    pub fn duplicate_block(name: impl Into<String>) -> Self {
        Self::DuplicateBlock { name: name.into() }
    }

    pub fn missing_block(name: impl Into<String>) -> Self {
        Self::MissingBlock { name: name.into() }
    }

    pub fn used_removal(name: impl Into<String>) -> Self {
        Self::UsedRemoval { name: name.into() }
    }

    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }
}
