//! Property tests over randomly generated terms.

use super::*;
use proptest::prelude::*;

const OPAQUE_IDS: u64 = 4;

fn arb_word() -> impl Strategy<Value = U256> {
    prop_oneof![
        Just(U256::ZERO),
        Just(U256::ONE),
        Just(U256::MAX),
        (0usize..256).prop_map(|shift| U256::ONE << shift),
        any::<u64>().prop_map(U256::from),
        any::<[u8; 32]>().prop_map(|bytes| U256::from_be_bytes(bytes)),
    ]
}

fn arb_term_from(leaf: BoxedStrategy<Expression>) -> impl Strategy<Value = Expression> {
    use eth_expr_data::Opcode as O;
    leaf.prop_recursive(4, 48, 3, |inner| {
        let unary = prop::sample::select(vec![O::IsZero, O::Not]);
        let binary = prop::sample::select(vec![
            O::Add,
            O::Mul,
            O::Sub,
            O::Div,
            O::SDiv,
            O::Mod,
            O::SMod,
            O::Exp,
            O::SignExtend,
            O::Lt,
            O::Gt,
            O::SLt,
            O::SGt,
            O::Eq,
            O::And,
            O::Or,
            O::Xor,
            O::Byte,
            O::Shl,
            O::Shr,
        ]);
        let ternary = prop::sample::select(vec![O::AddMod, O::MulMod]);
        prop_oneof![
            (unary, inner.clone()).prop_map(|(code, a)| Expression::unary(code, a)),
            (binary, inner.clone(), inner.clone())
                .prop_map(|(code, a, b)| Expression::binary(code, a, b)),
            (ternary, inner.clone(), inner.clone(), inner)
                .prop_map(|(code, a, b, c)| Expression::ternary(code, a, b, c)),
        ]
    })
}

/// Terms over constants and the opaque leaves `#0..#3`.
fn arb_term() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        arb_word().prop_map(Expression::Const),
        (0..OPAQUE_IDS).prop_map(Expression::opaque),
    ];
    arb_term_from(leaf.boxed())
}

/// Terms whose leaves are all constants.
fn arb_constant_term() -> impl Strategy<Value = Expression> {
    arb_term_from(arb_word().prop_map(Expression::Const).boxed())
}

fn assignment(values: (U256, U256, U256, U256)) -> HashMap<OpaqueId, U256> {
    HashMap::from([
        (OpaqueId(0), values.0),
        (OpaqueId(1), values.1),
        (OpaqueId(2), values.2),
        (OpaqueId(3), values.3),
    ])
}

fn all_pure() -> HashMap<OpaqueId, bool> {
    pure_opaques(&[0, 1, 2, 3])
}

fn assert_arities(expr: &Expression) {
    if let Expression::Op(code, args) = expr {
        assert_eq!(args.len(), code.arity(), "bad arity in {expr}");
        args.iter().for_each(assert_arities);
    }
}

/// True when an associative node still hides a constant deeper than a
/// non-constant sibling, i.e. a floating rule should have fired.
fn has_buried_constant(expr: &Expression) -> bool {
    use eth_expr_data::Opcode as O;
    fn same_op_with_const(expr: &Expression, code: Opcode) -> bool {
        matches!(
            expr,
            Expression::Op(inner, args) if *inner == code && args.iter().any(Expression::is_const)
        )
    }
    if let Expression::Op(code, args) = expr {
        if matches!(code, O::Add | O::SAdd | O::Mul | O::SMul | O::And | O::Or | O::Xor) {
            let (lhs, rhs) = (&args[0], &args[1]);
            if (same_op_with_const(lhs, *code) && !rhs.is_const())
                || (same_op_with_const(rhs, *code) && !lhs.is_const())
            {
                return true;
            }
        }
    }
    expr.children().iter().any(has_buried_constant)
}

proptest! {
    #[test]
    fn simplification_is_idempotent(term in arb_term()) {
        let catalog = catalog();
        let once = crate::simplify(term, &catalog, &NoPurityInfo);
        prop_assert!(!once.budget_exhausted);
        let twice = crate::simplify(once.expr.clone(), &catalog, &NoPurityInfo);
        prop_assert_eq!(&once.expr, &twice.expr);
        prop_assert_eq!(twice.rewrites, 0);
    }

    #[test]
    fn idempotent_with_pure_opaques(term in arb_term()) {
        let catalog = catalog();
        let oracle = all_pure();
        let once = crate::simplify(term, &catalog, &oracle);
        let twice = crate::simplify(once.expr.clone(), &catalog, &oracle);
        prop_assert_eq!(&once.expr, &twice.expr);
    }

    #[test]
    fn rewriting_preserves_evaluation(
        term in arb_term(),
        values in (arb_word(), arb_word(), arb_word(), arb_word()),
    ) {
        let assignment = assignment(values);
        let out = crate::simplify(term.clone(), &catalog(), &all_pure());
        prop_assert_eq!(
            eval(&term, &assignment),
            eval(&out.expr, &assignment),
            "term {} rewrote to {}",
            term,
            out.expr
        );
    }

    #[test]
    fn output_arities_are_well_formed(term in arb_term()) {
        let out = crate::simplify(term, &catalog(), &all_pure());
        assert_arities(&out.expr);
    }

    #[test]
    fn fully_constant_terms_fold_to_a_literal(term in arb_constant_term()) {
        let out = crate::simplify(term.clone(), &catalog(), &NoPurityInfo);
        prop_assert!(out.expr.is_const(), "{} left as {}", term, out.expr);
    }

    #[test]
    fn unknown_opaques_are_never_dropped(term in arb_term()) {
        let out = crate::simplify(term.clone(), &catalog(), &NoPurityInfo);
        for id in 0..OPAQUE_IDS {
            let leaf = Expression::opaque(id);
            prop_assert_eq!(
                out.expr.occurrences_of(&leaf),
                term.occurrences_of(&leaf),
                "{} occurrences changed rewriting {} to {}",
                leaf,
                term,
                out.expr
            );
        }
    }

    #[test]
    fn constants_end_up_outermost(term in arb_term()) {
        let out = crate::simplify(term, &catalog(), &all_pure());
        prop_assert!(!has_buried_constant(&out.expr), "buried constant in {}", out.expr);
    }
}
