//! Type, operator and binding definitions for the Rill IR

use serde::{Deserialize, Serialize};
use std::fmt;

/// The binding of a subroutine (locally or globally bound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binding {
    Local,
    Global,
}

impl Binding {
    /// The sigil printed before a bound name
    pub fn sigil(self) -> char {
        match self {
            Binding::Local => '%',
            Binding::Global => '@',
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sigil())
    }
}

/// The operation of a binary instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lsh,
    Rsh,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Nq,
}

impl Op {
    pub fn is_commutative(self) -> bool {
        matches!(self, Op::Add | Op::Mul | Op::Eq)
    }

    /// The lowercase opcode used in the text form
    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Lsh => "lsh",
            Op::Rsh => "rsh",
            Op::Lt => "lt",
            Op::Gt => "gt",
            Op::Le => "le",
            Op::Ge => "ge",
            Op::Eq => "eq",
            Op::Nq => "nq",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A type, carrying its bit width and signedness where applicable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    I1,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    F32,
    F64,
    Str,
    Void,
}

impl Type {
    /// The bit width of the type, if it has a concrete one
    pub fn bits(self) -> Option<u32> {
        match self {
            Type::I1 => Some(1),
            Type::I8 | Type::U8 => Some(8),
            Type::I16 | Type::U16 => Some(16),
            Type::I32 | Type::U32 | Type::F32 => Some(32),
            Type::I64 | Type::U64 | Type::F64 => Some(64),
            Type::I128 | Type::U128 => Some(128),
            Type::I256 | Type::U256 => Some(256),
            Type::Str | Type::Void => None,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::I128 | Type::I256
        )
    }

    pub fn is_unsigned(self) -> bool {
        !self.is_signed()
    }

    /// True for every type except the floats, strings and void
    pub fn is_int(self) -> bool {
        !matches!(self, Type::F32 | Type::F64 | Type::Str | Type::Void)
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::I1 => "i1",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::I128 => "i128",
            Type::I256 => "i256",
            Type::U8 => "u8",
            Type::U16 => "u16",
            Type::U32 => "u32",
            Type::U64 => "u64",
            Type::U128 => "u128",
            Type::U256 => "u256",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::Str => "string",
            Type::Void => "void",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parameter to be passed to a subroutine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}: {}", self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signedness_follows_names() {
        assert!(Type::I8.is_signed());
        assert!(Type::I256.is_signed());
        assert!(Type::U8.is_unsigned());
        assert!(Type::U256.is_unsigned());
        assert!(Type::I1.is_unsigned());
    }

    #[test]
    fn test_is_int() {
        assert!(Type::I1.is_int());
        assert!(Type::U64.is_int());
        assert!(!Type::F32.is_int());
        assert!(!Type::F64.is_int());
        assert!(!Type::Str.is_int());
        assert!(!Type::Void.is_int());
    }

    #[test]
    fn test_bits() {
        assert_eq!(Type::I1.bits(), Some(1));
        assert_eq!(Type::U128.bits(), Some(128));
        assert_eq!(Type::I256.bits(), Some(256));
        assert_eq!(Type::Void.bits(), None);
        assert_eq!(Type::Str.bits(), None);
    }

    #[test]
    fn test_commutative_ops() {
        assert!(Op::Add.is_commutative());
        assert!(Op::Mul.is_commutative());
        assert!(Op::Eq.is_commutative());
        assert!(!Op::Sub.is_commutative());
        assert!(!Op::Lsh.is_commutative());
        assert!(!Op::Nq.is_commutative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::I32.to_string(), "i32");
        assert_eq!(Type::Str.to_string(), "string");
        assert_eq!(Op::Add.to_string(), "add");
        assert_eq!(Binding::Local.to_string(), "%");
        assert_eq!(Binding::Global.to_string(), "@");
        assert_eq!(Parameter::new("x", Type::I64).to_string(), "%x: i64");
    }
}
