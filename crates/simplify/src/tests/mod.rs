//! End-to-end tests driving the public entry points on terms written
//! in the textual form. Shared helpers live here; the submodules split
//! by rule family plus a property suite.

mod properties;

use crate::{build_catalog, Catalog, NoPurityInfo, PlaceholderEnv, PurityOracle, Simplified};
use alloy_primitives::U256;
use eth_expr_data::{word, Expression, Opcode, OpaqueId};
use eth_expr_parser::parse_or_panic;
use std::collections::HashMap;

fn catalog() -> Catalog {
    build_catalog(PlaceholderEnv::new())
}

/// Oracle marking exactly the given opaque ids as pure.
fn pure_opaques(ids: &[u64]) -> HashMap<OpaqueId, bool> {
    ids.iter().map(|&id| (OpaqueId(id), true)).collect()
}

fn simplify_text(input: &str, oracle: &dyn PurityOracle) -> Simplified {
    crate::simplify(parse_or_panic(input), &catalog(), oracle)
}

/// Asserts `input` rewrites to `expected`, both in term syntax, with
/// an oracle that knows nothing about opaque leaves.
#[track_caller]
fn assert_simplifies(input: &str, expected: &str) {
    assert_simplifies_with(input, expected, &NoPurityInfo);
}

#[track_caller]
fn assert_simplifies_with(input: &str, expected: &str, oracle: &dyn PurityOracle) {
    let out = simplify_text(input, oracle);
    assert!(!out.budget_exhausted, "budget exhausted rewriting {input}");
    let want = parse_or_panic(expected);
    // The rendered form is injective (see the parser round-trip
    // tests), so comparing text gives structural equality plus a
    // readable diff.
    test_utils::assert_text_eq(
        &out.expr.to_string(),
        &want.to_string(),
        &format!("rewriting {input}"),
    );
}

/// Asserts `input` is already a fixed point under `oracle`.
#[track_caller]
fn assert_unchanged_with(input: &str, oracle: &dyn PurityOracle) {
    let out = simplify_text(input, oracle);
    assert_eq!(out.expr, parse_or_panic(input), "{input} was rewritten to {}", out.expr);
    assert_eq!(out.rewrites, 0, "{input} fired {} rule(s)", out.rewrites);
}

/// Reference interpreter for the algebraic subset; opaque leaves take
/// their value from `assignment`, environment nullaries evaluate to
/// fixed 160-bit words.
fn eval(expr: &Expression, assignment: &HashMap<OpaqueId, U256>) -> U256 {
    use eth_expr_data::Opcode as O;
    match expr {
        Expression::Const(value) => *value,
        Expression::Opaque(id) => assignment[id],
        Expression::Op(code, args) => {
            let arg = |i: usize| eval(&args[i], assignment);
            match code {
                O::Add | O::SAdd => word::add(arg(0), arg(1)),
                O::Mul | O::SMul => word::mul(arg(0), arg(1)),
                O::Sub | O::SSub => word::sub(arg(0), arg(1)),
                O::Div => word::udiv(arg(0), arg(1)),
                O::SDiv => word::sdiv(arg(0), arg(1)),
                O::Mod => word::umod(arg(0), arg(1)),
                O::SMod => word::smod(arg(0), arg(1)),
                O::Exp => word::exp(arg(0), arg(1)),
                O::AddMod => word::addmod(arg(0), arg(1), arg(2)),
                O::MulMod => word::mulmod(arg(0), arg(1), arg(2)),
                O::SignExtend => word::signextend(arg(0), arg(1)),
                O::Lt => word::lt(arg(0), arg(1)),
                O::Gt => word::gt(arg(0), arg(1)),
                O::SLt => word::slt(arg(0), arg(1)),
                O::SGt => word::sgt(arg(0), arg(1)),
                O::Eq => word::eq(arg(0), arg(1)),
                O::IsZero => word::iszero(arg(0)),
                O::And => word::and(arg(0), arg(1)),
                O::Or => word::or(arg(0), arg(1)),
                O::Xor => word::xor(arg(0), arg(1)),
                O::Not => word::not(arg(0)),
                O::Byte => word::byte(arg(0), arg(1)),
                O::Shl => word::shl(arg(0), arg(1)),
                O::Shr => word::shr(arg(0), arg(1)),
                O::Address => U256::from(0xa11a_u64),
                O::Caller => U256::from(0xca11_u64),
                O::Origin => U256::from(0x0819_u64),
                O::Coinbase => U256::from(0xc01b_u64),
                other => panic!("evaluator does not model {other}"),
            }
        }
    }
}
