//! Wrap-correct constant folding over binary operations
//!
//! Folding is computed in arbitrary precision and then wrapped to the result
//! type's bit width, so the outcome matches what fixed-width hardware
//! arithmetic of that width and signedness would produce. Division is
//! deliberately not folded; a modulo with zero divisor and shifts by
//! negative amounts are left unfolded as well.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rill_ir::{InstrId, InstrKind, Op, Subroutine};

/// Folds a binary instruction into a constant, when possible
///
/// The criteria to fold:
/// 1. The instruction is a binary operation with a foldable op
/// 2. Both operands are constants of a type with a concrete bit width
/// 3. The result type has a concrete bit width
///
/// The returned constant keeps the instruction's name and `ssa_id`.
pub fn fold_instr(sub: &Subroutine, instr: InstrId) -> Option<InstrKind> {
    let (def, op, x, y) = match sub.instr_kind(instr) {
        InstrKind::BinOp { def, op, x, y } => (def, *op, *x, *y),
        _ => return None,
    };
    if !is_foldable(op) {
        return None;
    }
    let bits = def.ty.bits()?;
    let x = parse_const(sub, x)?;
    let y = parse_const(sub, y)?;
    let folded = apply(op, x, y, bits)?;
    let wrapped = wrap(folded, bits, def.ty.is_signed());
    Some(InstrKind::Const { def: def.clone(), value: wrapped.to_string() })
}

fn is_foldable(op: Op) -> bool {
    matches!(op, Op::Add | Op::Sub | Op::Mul | Op::Mod | Op::Lsh | Op::Rsh)
}

fn parse_const(sub: &Subroutine, id: InstrId) -> Option<BigInt> {
    match sub.instr_kind(id) {
        InstrKind::Const { def, value } if def.ty.bits().is_some() => {
            BigInt::parse_bytes(value.as_bytes(), 10)
        }
        _ => None,
    }
}

fn apply(op: Op, x: BigInt, y: BigInt, bits: u32) -> Option<BigInt> {
    let folded = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Mod => {
            if y.is_zero() {
                return None;
            }
            floor_mod(x, y)
        }
        Op::Lsh => {
            if y.is_negative() {
                return None;
            }
            match y.to_u64() {
                Some(shift) if shift < u64::from(bits) => x << (shift as usize),
                // Shifting in at least `bits` zeros leaves nothing after the wrap
                _ => BigInt::zero(),
            }
        }
        Op::Rsh => {
            if y.is_negative() {
                return None;
            }
            match y.to_usize() {
                Some(shift) => x >> shift,
                None => {
                    if x.is_negative() {
                        -BigInt::one()
                    } else {
                        BigInt::zero()
                    }
                }
            }
        }
        _ => return None,
    };
    Some(folded)
}

/// Python-style modulo: the result takes the divisor's sign
fn floor_mod(x: BigInt, y: BigInt) -> BigInt {
    let r = &x % &y;
    if !r.is_zero() && r.is_negative() != y.is_negative() {
        r + y
    } else {
        r
    }
}

/// Wraps a value to the given amount of bits: reduce to the non-negative
/// residue, then reinterpret as two's complement if the type is signed and
/// the top bit ended up set
fn wrap(value: BigInt, bits: u32, signed: bool) -> BigInt {
    let base: BigInt = BigInt::one() << (bits as usize);
    let mut value = value % &base;
    if value.is_negative() {
        value += &base;
    }
    if signed && value >= (base.clone() >> 1) {
        value -= base;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ir::{Binding, Subroutine, Type};

    fn wrap_i64(value: i64, bits: u32, signed: bool) -> String {
        wrap(BigInt::from(value), bits, signed).to_string()
    }

    #[test]
    fn test_wrap_unsigned() {
        assert_eq!(wrap_i64(256, 8, false), "0");
        assert_eq!(wrap_i64(257, 8, false), "1");
        assert_eq!(wrap_i64(-1, 8, false), "255");
        assert_eq!(wrap_i64(40000, 8, false), "64");
    }

    #[test]
    fn test_wrap_signed() {
        assert_eq!(wrap_i64(128, 8, true), "-128");
        assert_eq!(wrap_i64(127, 8, true), "127");
        assert_eq!(wrap_i64(-129, 8, true), "127");
        assert_eq!(wrap_i64(200, 8, true), "-56");
        assert_eq!(wrap_i64(32768, 16, true), "-32768");
    }

    #[test]
    fn test_floor_mod_follows_divisor_sign() {
        assert_eq!(floor_mod(BigInt::from(-7), BigInt::from(3)).to_string(), "2");
        assert_eq!(floor_mod(BigInt::from(7), BigInt::from(-3)).to_string(), "-2");
        assert_eq!(floor_mod(BigInt::from(-5), BigInt::from(-3)).to_string(), "-2");
        assert_eq!(floor_mod(BigInt::from(6), BigInt::from(3)).to_string(), "0");
    }

    fn fold_binop(ty: Type, op: Op, x: &str, y: &str) -> Option<String> {
        let mut sub = Subroutine::procedure("p", vec![], Binding::Local);
        let x = sub.new_const("x", ty, x);
        let y = sub.new_const("y", ty, y);
        let instr = sub.new_binop("z", ty, op, x, y).unwrap();
        match fold_instr(&sub, instr) {
            Some(InstrKind::Const { value, .. }) => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_fold_basic_arithmetic() {
        assert_eq!(fold_binop(Type::I32, Op::Add, "2", "3"), Some("5".to_string()));
        assert_eq!(fold_binop(Type::I32, Op::Sub, "2", "3"), Some("-1".to_string()));
        assert_eq!(fold_binop(Type::U8, Op::Mul, "200", "200"), Some("64".to_string()));
        assert_eq!(fold_binop(Type::I8, Op::Add, "100", "100"), Some("-56".to_string()));
    }

    #[test]
    fn test_fold_shifts() {
        assert_eq!(fold_binop(Type::I32, Op::Lsh, "1", "4"), Some("16".to_string()));
        assert_eq!(fold_binop(Type::I32, Op::Lsh, "1", "33"), Some("0".to_string()));
        assert_eq!(fold_binop(Type::I16, Op::Lsh, "1", "15"), Some("-32768".to_string()));
        assert_eq!(fold_binop(Type::I32, Op::Rsh, "-8", "1"), Some("-4".to_string()));
        assert_eq!(fold_binop(Type::U32, Op::Rsh, "8", "2"), Some("2".to_string()));
        assert_eq!(fold_binop(Type::I32, Op::Lsh, "1", "-1"), None);
    }

    #[test]
    fn test_fold_wide_types_stay_exact() {
        // 2^200 wraps away in u128 but not in u256
        let big = BigInt::one() << 200usize;
        assert_eq!(
            fold_binop(Type::U256, Op::Add, &big.to_string(), &big.to_string()),
            Some((BigInt::one() << 201usize).to_string())
        );
        assert_eq!(
            fold_binop(Type::U128, Op::Add, &big.to_string(), "0"),
            Some((big % (BigInt::one() << 128usize)).to_string())
        );
    }

    #[test]
    fn test_div_and_zero_mod_never_fold() {
        assert_eq!(fold_binop(Type::I32, Op::Div, "6", "3"), None);
        assert_eq!(fold_binop(Type::I32, Op::Mod, "6", "0"), None);
        assert_eq!(fold_binop(Type::I32, Op::Mod, "-7", "3"), Some("2".to_string()));
    }

    #[test]
    fn test_comparisons_never_fold() {
        assert_eq!(fold_binop(Type::I32, Op::Lt, "1", "2"), None);
        assert_eq!(fold_binop(Type::I32, Op::Eq, "1", "1"), None);
    }

    #[test]
    fn test_fold_keeps_name_and_ssa_id() {
        let mut sub = Subroutine::procedure("p", vec![], Binding::Local);
        let x = sub.new_const("x", Type::I32, "2");
        let y = sub.new_const("y", Type::I32, "3");
        let instr = sub.new_binop("z", Type::I32, Op::Add, x, y).unwrap();
        sub.set_ssa_id(instr, 7);
        match fold_instr(&sub, instr) {
            Some(InstrKind::Const { def, value }) => {
                assert_eq!(def.name, "z");
                assert_eq!(def.ssa_id, Some(7));
                assert_eq!(value, "5");
            }
            other => panic!("expected a folded constant, got {:?}", other),
        }
    }

    #[test]
    fn test_non_const_operands_never_fold() {
        let mut sub = Subroutine::procedure("p", vec![], Binding::Local);
        let x = sub.new_const("x", Type::I32, "2");
        let c = sub.new_id("c", Type::I32, x).unwrap();
        let instr = sub.new_binop("z", Type::I32, Op::Add, x, c).unwrap();
        assert_eq!(fold_instr(&sub, instr), None);
    }
}
