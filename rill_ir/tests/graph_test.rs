//! Integration tests for the IR graph and its use-def maintenance

use proptest::prelude::*;
use rill_common::RillError;
use rill_ir::{Binding, InstrKind, Op, Operand, Subroutine, Type};
use std::collections::HashSet;

fn proc(name: &str) -> Subroutine {
    Subroutine::procedure(name, vec![], Binding::Local)
}

/// Checks the structural invariants the graph promises after every mutation
fn check_graph_invariants(sub: &Subroutine) {
    for instr in sub.instr_ids() {
        for &var in sub.used_vars(instr) {
            assert!(
                sub.users(var).contains(&instr),
                "use-def symmetry broken: missing user edge"
            );
        }
        for &user in sub.users(instr) {
            assert!(
                sub.used_vars(user).contains(&instr),
                "use-def symmetry broken: missing used-var edge"
            );
        }
        let users: HashSet<_> = sub.users(instr).iter().collect();
        assert_eq!(users.len(), sub.users(instr).len(), "duplicate user entry");
        let used: HashSet<_> = sub.used_vars(instr).iter().collect();
        assert_eq!(used.len(), sub.used_vars(instr).len(), "duplicate used-var entry");
    }
    for block in sub.blocks() {
        for &pred in sub.preds(block) {
            assert!(sub.succs(pred).contains(&block), "pred without matching succ");
        }
        for &succ in sub.succs(block) {
            assert!(sub.preds(succ).contains(&block), "succ without matching pred");
        }
        for &instr in sub.block_instrs(block) {
            assert_eq!(sub.instr_block(instr), Some(block));
        }
        for &phi in sub.block_phis(block) {
            assert_eq!(sub.instr_block(phi), Some(block));
        }
    }
}

#[test]
fn test_use_def_symmetry_on_creation() {
    let mut sub = proc("p");
    let x = sub.new_const("x", Type::I32, "1");
    let y = sub.new_const("y", Type::I32, "2");
    let z = sub.new_binop("z", Type::I32, Op::Add, x, y).unwrap();

    assert_eq!(sub.used_vars(z), &[x, y]);
    assert_eq!(sub.users(x), &[z]);
    assert_eq!(sub.users(y), &[z]);
    assert!(sub.used_vars(x).is_empty());
    check_graph_invariants(&sub);
}

#[test]
fn test_duplicate_operand_registers_once() {
    let mut sub = proc("p");
    let x = sub.new_const("x", Type::I32, "1");
    let z = sub.new_binop("z", Type::I32, Op::Add, x, x).unwrap();

    assert_eq!(sub.used_vars(z), &[x]);
    assert_eq!(sub.users(x), &[z]);
    assert_eq!(sub.operand_at(z, 1).unwrap(), Operand::Value(x));
    assert_eq!(sub.operand_at(z, 2).unwrap(), Operand::Value(x));
}

#[test]
fn test_cfg_edges_are_symmetric_and_idempotent() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let bb1 = sub.add_block("bb1").unwrap();

    sub.add_pred(bb1, bb0);
    sub.add_pred(bb1, bb0);
    sub.add_succ(bb0, bb1);

    assert_eq!(sub.preds(bb1), &[bb0]);
    assert_eq!(sub.succs(bb0), &[bb1]);
    assert!(sub.preds(bb0).is_empty());
    check_graph_invariants(&sub);
}

#[test]
fn test_duplicate_block_is_rejected() {
    let mut sub = proc("p");
    sub.add_block("bb0").unwrap();
    assert_eq!(
        sub.add_block("bb0"),
        Err(RillError::duplicate_block("bb0"))
    );
}

#[test]
fn test_remove_unknown_block_is_rejected() {
    let mut sub = proc("p");
    assert_eq!(sub.remove_block("nope"), Err(RillError::missing_block("nope")));
}

#[test]
fn test_removing_a_used_instruction_fails() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let x = sub.new_const("x", Type::I32, "1");
    sub.add_instr(bb0, x).unwrap();
    let z = sub.new_id("z", Type::I32, x).unwrap();
    sub.add_instr(bb0, z).unwrap();

    assert!(matches!(sub.remove_instr(x), Err(RillError::UsedRemoval { .. })));
    // Still fully linked afterwards
    assert_eq!(sub.instr_block(x), Some(bb0));
    check_graph_invariants(&sub);
}

#[test]
fn test_remove_instr_clears_edges() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let x = sub.new_const("x", Type::I32, "1");
    let y = sub.new_const("y", Type::I32, "2");
    sub.add_instr(bb0, x).unwrap();
    sub.add_instr(bb0, y).unwrap();
    let z = sub.new_binop("z", Type::I32, Op::Add, x, y).unwrap();
    sub.add_instr(bb0, z).unwrap();

    sub.remove_instr(z).unwrap();
    assert_eq!(sub.instr_block(z), None);
    assert!(sub.users(x).is_empty());
    assert!(sub.users(y).is_empty());
    assert!(sub.used_vars(z).is_empty());
    assert_eq!(sub.block_instrs(bb0), &[x, y]);
    check_graph_invariants(&sub);
}

#[test]
fn test_replace_instr_takes_over_position_and_users() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    let b = sub.new_id("b", Type::I32, a).unwrap();
    sub.add_instr(bb0, b).unwrap();

    let c = sub.new_const("c", Type::I32, "2");
    sub.replace_instr(bb0, a, c).unwrap();

    assert_eq!(sub.block_instrs(bb0), &[c, b]);
    assert_eq!(sub.instr_block(a), None);
    assert!(sub.users(a).is_empty());
    assert_eq!(sub.users(c), &[b]);
    match sub.instr_kind(b) {
        InstrKind::Id { value, .. } => assert_eq!(*value, c),
        other => panic!("expected an id, got {:?}", other),
    }
    check_graph_invariants(&sub);
}

#[test]
fn test_replace_instr_preconditions() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();

    // The replacement must not already be attached
    let attached = sub.new_const("b", Type::I32, "2");
    sub.add_instr(bb0, attached).unwrap();
    assert_eq!(sub.replace_instr(bb0, a, attached), Err(RillError::InstrAttached));

    // The replacement must not be used
    let used = sub.new_const("c", Type::I32, "3");
    let _user = sub.new_id("d", Type::I32, used).unwrap();
    assert!(matches!(
        sub.replace_instr(bb0, a, used),
        Err(RillError::UsedRemoval { .. })
    ));

    // The old instruction must be in the block
    let detached = sub.new_const("e", Type::I32, "4");
    let fresh = sub.new_const("f", Type::I32, "5");
    assert_eq!(sub.replace_instr(bb0, detached, fresh), Err(RillError::MissingInstr));
}

#[test]
fn test_mistyped_operands_are_rejected() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let br = sub.new_ubr(bb0);
    let x = sub.new_const("x", Type::I32, "1");

    assert_eq!(
        sub.new_binop("z", Type::I32, Op::Add, x, br),
        Err(RillError::MistypedOperand { opcode: "add" })
    );
    assert_eq!(
        sub.new_return(Type::I32, br),
        Err(RillError::MistypedOperand { opcode: "return" })
    );
}

#[test]
fn test_replace_use_is_unsupported_on_operandless_variants() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let x = sub.new_const("x", Type::I32, "1");
    let y = sub.new_const("y", Type::I32, "2");
    let br = sub.new_ubr(bb0);

    assert_eq!(
        sub.replace_use(x, y, y),
        Err(RillError::UnsupportedOperand { opcode: "const" })
    );
    assert_eq!(
        sub.replace_use(br, x, y),
        Err(RillError::UnsupportedOperand { opcode: "ubr" })
    );
}

#[test]
fn test_remove_user_requires_registration() {
    let mut sub = proc("p");
    let x = sub.new_const("x", Type::I32, "1");
    let y = sub.new_const("y", Type::I32, "2");
    assert_eq!(sub.remove_user(x, y), Err(RillError::NotAUser));
}

#[test]
fn test_phi_inputs_must_be_attached() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let phi = sub.new_phi("k", Type::Void);
    sub.add_phi_instr(bb0, phi).unwrap();

    let detached = sub.new_const("k", Type::I32, "1");
    assert_eq!(sub.add_phi_input(phi, detached), Err(RillError::UnattachedPhiInput));

    sub.add_instr(bb0, detached).unwrap();
    sub.add_phi_input(phi, detached).unwrap();
    assert_eq!(sub.operand_count(phi), 1);
    check_graph_invariants(&sub);
}

#[test]
fn test_phi_operand_indices_cover_every_input() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    let b = sub.new_const("b", Type::I32, "2");
    sub.add_instr(bb0, b).unwrap();
    let phi = sub.new_phi("k", Type::Void);
    sub.add_phi_instr(bb0, phi).unwrap();
    sub.add_phi_input(phi, a).unwrap();
    sub.add_phi_input(phi, b).unwrap();

    assert_eq!(sub.operand_at(phi, 0).unwrap(), Operand::Value(a));
    assert_eq!(sub.operand_at(phi, 1).unwrap(), Operand::Value(b));
    assert_eq!(
        sub.operand_at(phi, 2),
        Err(RillError::OperandIndex { opcode: "phi", index: 2 })
    );
}

#[test]
fn test_replace_use_rewrites_every_phi_occurrence() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    let b = sub.new_const("b", Type::I32, "2");
    sub.add_instr(bb0, b).unwrap();
    let phi = sub.new_phi("k", Type::Void);
    sub.add_phi_instr(bb0, phi).unwrap();
    sub.add_phi_input(phi, a).unwrap();
    sub.add_phi_input(phi, a).unwrap();

    sub.replace_use(phi, a, b).unwrap();
    match sub.instr_kind(phi) {
        InstrKind::Phi { inputs, .. } => assert_eq!(inputs, &[b, b]),
        other => panic!("expected a phi, got {:?}", other),
    }
    assert_eq!(sub.used_vars(phi), &[b]);
    assert!(sub.users(a).is_empty());
    check_graph_invariants(&sub);
}

#[test]
fn test_call_argument_maintenance() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    let call = sub.new_procedure_call("println", vec![a]).unwrap();
    sub.add_instr(bb0, call).unwrap();

    let b = sub.new_const("b", Type::I32, "2");
    sub.add_instr(bb0, b).unwrap();
    sub.add_call_arg(call, b).unwrap();
    assert_eq!(sub.used_vars(call), &[a, b]);
    assert_eq!(sub.operand_at(call, 0).unwrap(), Operand::Callee("println".to_string()));
    assert_eq!(sub.operand_at(call, 2).unwrap(), Operand::Value(b));

    sub.remove_call_arg(call, a).unwrap();
    assert_eq!(sub.used_vars(call), &[b]);
    assert!(sub.users(a).is_empty());
    assert!(matches!(
        sub.remove_call_arg(call, a),
        Err(RillError::MissingParam { .. })
    ));
    check_graph_invariants(&sub);
}

#[test]
fn test_binop_and_cbr_operand_layouts() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let bb1 = sub.add_block("bb1").unwrap();
    let bb2 = sub.add_block("bb2").unwrap();
    let x = sub.new_const("x", Type::I32, "1");
    sub.add_instr(bb0, x).unwrap();
    let y = sub.new_const("y", Type::I32, "2");
    sub.add_instr(bb0, y).unwrap();
    let z = sub.new_binop("z", Type::I32, Op::Mul, x, y).unwrap();
    sub.add_instr(bb0, z).unwrap();
    let t = sub.new_const("t", Type::I1, "1");
    sub.add_instr(bb0, t).unwrap();
    let cbr = sub.new_cbr(t, bb1, bb2).unwrap();
    sub.add_instr(bb0, cbr).unwrap();

    assert_eq!(sub.operand_count(z), 3);
    assert_eq!(sub.operand_at(z, 0).unwrap(), Operand::Opcode(Op::Mul));
    assert_eq!(sub.operand_at(z, 1).unwrap(), Operand::Value(x));
    assert_eq!(sub.operand_at(z, 2).unwrap(), Operand::Value(y));

    assert_eq!(sub.operand_count(cbr), 3);
    assert_eq!(sub.operand_at(cbr, 0).unwrap(), Operand::Value(t));
    assert_eq!(sub.operand_at(cbr, 1).unwrap(), Operand::Block(bb1));
    assert_eq!(sub.operand_at(cbr, 2).unwrap(), Operand::Block(bb2));
    assert_eq!(sub.operand_at(x, 0).unwrap(), Operand::Literal("1".to_string()));

    // Redirecting a value slot goes through the use-def bookkeeping
    sub.set_operand_at(z, 2, Operand::Value(x)).unwrap();
    match sub.instr_kind(z) {
        InstrKind::BinOp { x: lhs, y: rhs, .. } => {
            assert_eq!(*lhs, x);
            assert_eq!(*rhs, x);
        }
        other => panic!("expected a binop, got {:?}", other),
    }
    assert!(sub.users(y).is_empty());
    check_graph_invariants(&sub);
}

#[test]
fn test_phi_list_and_instr_list_stay_separate() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let phi = sub.new_phi("k", Type::Void);
    let x = sub.new_const("x", Type::I32, "1");

    assert_eq!(sub.add_instr(bb0, phi), Err(RillError::UnexpectedPhi));
    assert_eq!(sub.add_phi_instr(bb0, x), Err(RillError::ExpectedPhi));

    sub.add_phi_instr(bb0, phi).unwrap();
    sub.add_instr(bb0, x).unwrap();
    assert_eq!(sub.block_phis(bb0), &[phi]);
    assert_eq!(sub.block_instrs(bb0), &[x]);
}

#[test]
fn test_insert_instr_position() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    let b = sub.new_const("b", Type::I32, "2");
    sub.add_instr(bb0, b).unwrap();
    let c = sub.new_const("c", Type::I32, "3");
    sub.insert_instr(bb0, 1, c).unwrap();

    assert_eq!(sub.block_instrs(bb0), &[a, c, b]);
}

#[test]
fn test_attaching_twice_is_rejected() {
    let mut sub = proc("p");
    let bb0 = sub.add_block("bb0").unwrap();
    let bb1 = sub.add_block("bb1").unwrap();
    let a = sub.new_const("a", Type::I32, "1");
    sub.add_instr(bb0, a).unwrap();
    assert_eq!(sub.add_instr(bb1, a), Err(RillError::InstrAttached));
}

proptest! {
    /// Random straight-line construction and removal keeps every invariant
    #[test]
    fn random_graphs_keep_invariants(
        steps in proptest::collection::vec((0u8..3, any::<u8>(), any::<u8>()), 1..40)
    ) {
        let mut sub = proc("p");
        let bb0 = sub.add_block("bb0").unwrap();
        let seed = sub.new_const("v0", Type::I32, "0");
        sub.add_instr(bb0, seed).unwrap();
        let mut pool = vec![seed];

        for (step, (kind, a, b)) in steps.into_iter().enumerate() {
            let name = format!("v{}", step + 1);
            let x = pool[a as usize % pool.len()];
            let y = pool[b as usize % pool.len()];
            let instr = match kind {
                0 => sub.new_const(name, Type::I32, "1"),
                1 => sub.new_binop(name, Type::I32, Op::Add, x, y).unwrap(),
                _ => sub.new_id(name, Type::I32, x).unwrap(),
            };
            sub.add_instr(bb0, instr).unwrap();
            pool.push(instr);
        }
        check_graph_invariants(&sub);

        // Tear down every unused instruction, newest first
        for &instr in pool.iter().rev() {
            if sub.instr_block(instr).is_some() && !sub.is_used(instr) {
                sub.remove_instr(instr).unwrap();
            }
        }
        check_graph_invariants(&sub);
    }
}
